// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Challenge payload types exchanged with cert-manager.
//!
//! cert-manager posts a `ChallengePayload` carrying a `request` for every
//! DNS-01 `Present`/`CleanUp` and expects the same envelope back with a
//! `response`. Field names follow the `webhook.acme.cert-manager.io/v1alpha1`
//! JSON schema.

use crate::constants::{CHALLENGE_PAYLOAD_API_VERSION, CHALLENGE_PAYLOAD_KIND};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use serde::{Deserialize, Serialize};

/// What the caller wants done with the challenge record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Publish the TXT record
    #[default]
    Present,
    /// Remove the TXT record
    CleanUp,
}

impl ChallengeAction {
    /// Lowercase label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::CleanUp => "cleanup",
        }
    }
}

/// One DNS-01 validation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Unique ID of this request, echoed on the response
    #[serde(default)]
    pub uid: String,

    /// `Present` or `CleanUp`
    pub action: ChallengeAction,

    /// Challenge type; always `dns-01` for this solver
    #[serde(default, rename = "type")]
    pub challenge_type: String,

    /// Name being validated (e.g. `example.com` or `*.example.com`)
    #[serde(default)]
    pub dns_name: String,

    /// Expected TXT record value
    #[serde(default)]
    pub key: String,

    /// Namespace credential secrets are looked up in
    #[serde(default)]
    pub resource_namespace: String,

    /// Fully-qualified challenge record name (`_acme-challenge.example.com.`)
    #[serde(default, rename = "resolvedFQDN")]
    pub resolved_fqdn: String,

    /// Fully-qualified apex zone (`example.com.`)
    #[serde(default)]
    pub resolved_zone: String,

    /// Whether ambient (pod-level) credentials may be used; ignored by this solver
    #[serde(default)]
    pub allow_ambient_credentials: bool,

    /// Opaque solver configuration from the `Issuer`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl ChallengeRequest {
    /// Name of the TXT record to manage.
    ///
    /// ESA expects the full record name, so this is the resolved FQDN without
    /// its trailing dot; the zone is never used to shorten it.
    #[must_use]
    pub fn record_name(&self) -> String {
        un_fqdn(&self.resolved_fqdn).to_string()
    }
}

/// Result of handling one [`ChallengeRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// UID of the request this answers
    #[serde(default)]
    pub uid: String,

    /// Whether the action succeeded
    #[serde(default)]
    pub success: bool,

    /// Failure details; absent on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ChallengeResponse {
    /// Successful response for `uid`.
    #[must_use]
    pub fn success(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            success: true,
            status: None,
        }
    }

    /// Failed response for `uid` carrying a reason and the full error chain.
    #[must_use]
    pub fn failure(uid: &str, reason: &str, message: String) -> Self {
        Self {
            uid: uid.to_string(),
            success: false,
            status: Some(Status {
                status: Some("Failure".to_string()),
                reason: Some(reason.to_string()),
                message: Some(message),
                ..Default::default()
            }),
        }
    }
}

/// Envelope posted by cert-manager and returned by the webhook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    /// Always `webhook.acme.cert-manager.io/v1alpha1`
    #[serde(default)]
    pub api_version: String,

    /// Always `ChallengePayload`
    #[serde(default)]
    pub kind: String,

    /// Set on inbound payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    /// Set on outbound payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Wrap a response in a fresh envelope.
    #[must_use]
    pub fn with_response(response: ChallengeResponse) -> Self {
        Self {
            api_version: CHALLENGE_PAYLOAD_API_VERSION.to_string(),
            kind: CHALLENGE_PAYLOAD_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// Strip one trailing dot from a fully-qualified name.
///
/// ```rust
/// use esa_webhook::challenge::un_fqdn;
///
/// assert_eq!(un_fqdn("_acme-challenge.example.com."), "_acme-challenge.example.com");
/// assert_eq!(un_fqdn("example.com"), "example.com");
/// ```
#[must_use]
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

#[cfg(test)]
#[path = "challenge_tests.rs"]
mod challenge_tests;
