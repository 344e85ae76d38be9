// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Alibaba Cloud ESA (Edge Security Acceleration) API client.
//!
//! This module provides the control-plane calls the solver needs:
//!
//! - `ListSites` to map a zone to its numeric site ID
//! - `CreateRecord` to publish a challenge TXT record
//! - `ListRecords` to find a TXT record by name and value
//! - `DeleteRecord` to remove it again
//!
//! # Architecture
//!
//! [`DnsApi`] is the seam between the challenge protocol (site resolution,
//! record management) and the transport. [`EsaClient`] implements it over
//! HTTPS with ACS3-HMAC-SHA256 signing; `memory::InMemoryDnsApi` (behind the
//! `test-support` feature) implements it in memory. A [`ClientFactory`]
//! turns resolved credentials into a handle, once per challenge call.
//!
//! # Example
//!
//! ```rust,no_run
//! use esa_webhook::esa::{credential::build_client, DnsApi};
//! use esa_webhook::esa::types::ListSitesRequest;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = build_client(b"LTAI5tExample", b"secret", "cn-hangzhou")?;
//! let page = client
//!     .list_sites(&ListSitesRequest { page_number: 1, page_size: 100 })
//!     .await?;
//! println!("{} sites", page.total_count.unwrap_or(0));
//! # Ok(())
//! # }
//! ```

pub mod credential;
#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod sign;
pub mod types;

use crate::constants::{EMPTY_BODY_SHA256, ESA_API_VERSION, ESA_REQUEST_TIMEOUT_SECS};
use crate::errors::{EsaApiError, SolverError};
use crate::metrics;
use async_trait::async_trait;
use chrono::Utc;
use credential::{build_client, endpoint_for_region, AccessKeyCredential};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sign::SigningInput;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use types::{
    CreateRecordRequest, CreateRecordResponse, DeleteRecordRequest, DeleteRecordResponse,
    ErrorResponse, ListRecordsRequest, ListRecordsResponse, ListSitesRequest, ListSitesResponse,
};
use url::Url;

/// Maximum number of response body bytes included in logs and errors
const LOG_TRUNCATE_LIMIT: usize = 256;

/// ESA record-management operations used by the challenge protocol.
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// List one page of sites.
    async fn list_sites(&self, request: &ListSitesRequest)
        -> Result<ListSitesResponse, EsaApiError>;

    /// Create a record under a site.
    async fn create_record(
        &self,
        request: &CreateRecordRequest,
    ) -> Result<CreateRecordResponse, EsaApiError>;

    /// List one page of records of a site, filtered by name and type.
    async fn list_records(
        &self,
        request: &ListRecordsRequest,
    ) -> Result<ListRecordsResponse, EsaApiError>;

    /// Delete a record by ID.
    async fn delete_record(
        &self,
        request: &DeleteRecordRequest,
    ) -> Result<DeleteRecordResponse, EsaApiError>;
}

/// Builds an authenticated [`DnsApi`] handle from resolved secret material.
pub trait ClientFactory: Send + Sync {
    /// Build a handle scoped to `region`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::Credential`] if the key material is rejected
    /// - [`SolverError::ClientInit`] if the handle cannot be constructed
    fn build(
        &self,
        access_key_id: &[u8],
        access_key_secret: &[u8],
        region: &str,
    ) -> Result<Arc<dyn DnsApi>, SolverError>;
}

/// [`ClientFactory`] producing real [`EsaClient`]s.
#[derive(Debug, Clone, Default)]
pub struct EsaClientFactory {
    base_url: Option<Url>,
}

impl EsaClientFactory {
    /// Factory targeting the regional public endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory targeting a fixed base URL (private endpoint, proxy, test server).
    #[must_use]
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
        }
    }
}

impl ClientFactory for EsaClientFactory {
    fn build(
        &self,
        access_key_id: &[u8],
        access_key_secret: &[u8],
        region: &str,
    ) -> Result<Arc<dyn DnsApi>, SolverError> {
        let client = match &self.base_url {
            Some(base_url) => {
                let credential =
                    AccessKeyCredential::from_secret_bytes(access_key_id, access_key_secret)?;
                EsaClient::with_base_url(credential, region, base_url.clone())?
            }
            None => build_client(access_key_id, access_key_secret, region)?,
        };
        Ok(Arc::new(client))
    }
}

/// Authenticated ESA client scoped to one region.
#[derive(Debug, Clone)]
pub struct EsaClient {
    http: HttpClient,
    credential: AccessKeyCredential,
    region: String,
    base_url: Url,
    host: String,
}

impl EsaClient {
    /// Create a client for the regional endpoint `esa.{region}.aliyuncs.com`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ClientInit`] if the region is invalid or the
    /// HTTP client cannot be built.
    pub fn new(credential: AccessKeyCredential, region: &str) -> Result<Self, SolverError> {
        let endpoint = endpoint_for_region(region)?;
        let base_url = Url::parse(&format!("https://{endpoint}/")).map_err(|e| {
            SolverError::ClientInit {
                reason: format!("invalid endpoint {endpoint}: {e}"),
            }
        })?;
        Self::with_base_url(credential, region, base_url)
    }

    /// Create a client that sends every request to `base_url`.
    ///
    /// The region is still validated so the same configuration works against
    /// the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::ClientInit`] if the region is invalid, the URL
    /// has no host, or the HTTP client cannot be built.
    pub fn with_base_url(
        credential: AccessKeyCredential,
        region: &str,
        base_url: Url,
    ) -> Result<Self, SolverError> {
        endpoint_for_region(region)?;

        let host = match (base_url.host_str(), base_url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(SolverError::ClientInit {
                    reason: format!("endpoint {base_url} has no host"),
                })
            }
        };

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(ESA_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SolverError::ClientInit {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            credential,
            region: region.to_string(),
            base_url,
            host,
        })
    }

    /// Region this client is scoped to.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// `host` the requests are signed for.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// AccessKey ID the requests are signed with.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        self.credential.access_key_id()
    }

    /// Execute one RPC-style call and decode the response body.
    async fn call<T, P>(&self, action: &str, params: &P) -> Result<T, EsaApiError>
    where
        T: DeserializeOwned,
        P: Serialize + std::fmt::Debug,
    {
        let result = self.call_internal(action, params).await;
        metrics::record_esa_request(action, result.is_ok());
        result
    }

    async fn call_internal<T, P>(&self, action: &str, params: &P) -> Result<T, EsaApiError>
    where
        T: DeserializeOwned,
        P: Serialize + std::fmt::Debug,
    {
        let query_string = types::to_query_string(params).map_err(|e| EsaApiError::Encode {
            action: action.to_string(),
            reason: e.to_string(),
        })?;

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let authorization = sign::authorization(
            &self.credential,
            &SigningInput {
                method: "POST",
                host: &self.host,
                action,
                query_string: &query_string,
                timestamp: &timestamp,
                nonce: &nonce,
            },
        )
        .map_err(|e| EsaApiError::Encode {
            action: action.to_string(),
            reason: format!("failed to sign request: {e}"),
        })?;

        let mut url = self.base_url.clone();
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }

        debug!(
            action = %action,
            host = %self.host,
            region = %self.region,
            params = ?params,
            "ESA API request"
        );

        let response = self
            .http
            .post(url)
            .header("x-acs-action", action)
            .header("x-acs-version", ESA_API_VERSION)
            .header("x-acs-date", &timestamp)
            .header("x-acs-signature-nonce", &nonce)
            .header("x-acs-content-sha256", EMPTY_BODY_SHA256)
            .header("authorization", authorization)
            .send()
            .await
            .map_err(|e| EsaApiError::Transport {
                action: action.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| EsaApiError::Transport {
            action: action.to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        debug!(
            action = %action,
            status = status,
            body = %truncate_for_log(&body),
            "ESA API response"
        );

        if !(200..300).contains(&status) {
            let err = match api_error(action, status, &body) {
                Some(err) => err,
                None => EsaApiError::Http {
                    action: action.to_string(),
                    status,
                    body: truncate_for_log(&body),
                },
            };
            error!(action = %action, status = status, error = %err, "ESA API call failed");
            return Err(err);
        }

        // A 2xx body can still carry an error envelope
        if let Some(err) = api_error(action, status, &body) {
            error!(action = %action, status = status, error = %err, "ESA API call failed");
            return Err(err);
        }

        serde_json::from_str(&body).map_err(|e| EsaApiError::Decode {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl DnsApi for EsaClient {
    async fn list_sites(
        &self,
        request: &ListSitesRequest,
    ) -> Result<ListSitesResponse, EsaApiError> {
        self.call("ListSites", request).await
    }

    async fn create_record(
        &self,
        request: &CreateRecordRequest,
    ) -> Result<CreateRecordResponse, EsaApiError> {
        self.call("CreateRecord", request).await
    }

    async fn list_records(
        &self,
        request: &ListRecordsRequest,
    ) -> Result<ListRecordsResponse, EsaApiError> {
        self.call("ListRecords", request).await
    }

    async fn delete_record(
        &self,
        request: &DeleteRecordRequest,
    ) -> Result<DeleteRecordResponse, EsaApiError> {
        self.call("DeleteRecord", request).await
    }
}

/// Parse a structured `Code`/`Message` error body, if present.
fn api_error(action: &str, status: u16, body: &str) -> Option<EsaApiError> {
    let parsed: ErrorResponse = serde_json::from_str(body).ok()?;
    match (parsed.code, parsed.message) {
        (Some(code), Some(message)) => Some(EsaApiError::Api {
            action: action.to_string(),
            status,
            code,
            message,
            request_id: parsed.request_id,
        }),
        _ => None,
    }
}

/// Truncate a response body for logging and error messages.
fn truncate_for_log(s: &str) -> String {
    if s.len() <= LOG_TRUNCATE_LIMIT {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..s.floor_char_boundary(LOG_TRUNCATE_LIMIT)],
            s.len()
        )
    }
}
