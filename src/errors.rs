// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for challenge fulfillment.
//!
//! This module provides specialized error types for:
//! - Decoding the opaque solver configuration
//! - Resolving credential material from Kubernetes secrets
//! - Building an authenticated ESA client
//! - ESA API calls (list, create, delete)
//!
//! Every step of `present` and `cleanup` returns one of these kinds. The
//! orchestrator wraps them with a step description before they reach the
//! webhook caller, so the typed kind stays reachable via
//! [`anyhow::Error::downcast_ref`].
//!
//! Causes are rendered into each message and not chained as `source()`.

use thiserror::Error;

/// Errors that can occur while fulfilling one DNS-01 challenge.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The opaque solver configuration is not valid JSON for
    /// [`ProviderConfig`](crate::config::ProviderConfig).
    #[error("error decoding solver config: {0}")]
    ConfigDecode(serde_json::Error),

    /// The referenced secret object does not exist.
    #[error("failed to load secret \"{namespace}/{name}\": secret not found")]
    SecretNotFound {
        /// Namespace the secret was looked up in
        namespace: String,
        /// Secret name
        name: String,
    },

    /// The secret exists but carries no entry under the requested key.
    #[error("no key \"{key}\" in secret \"{namespace}/{name}\"")]
    SecretKeyNotFound {
        /// Namespace of the secret
        namespace: String,
        /// Secret name
        name: String,
        /// Key that was requested
        key: String,
    },

    /// The secret store failed for a reason other than not-found
    /// (RBAC denial, API server unreachable, ...).
    #[error("failed to load secret \"{namespace}/{name}\": {reason}")]
    SecretLookup {
        /// Namespace of the secret
        namespace: String,
        /// Secret name
        name: String,
        /// Underlying store error
        reason: String,
    },

    /// Access key material was rejected before any network call.
    #[error("failed to create credential: {reason}")]
    Credential {
        /// Why the material was rejected
        reason: String,
    },

    /// The ESA client could not be constructed.
    #[error("failed to create ESA client: {reason}")]
    ClientInit {
        /// Why construction failed
        reason: String,
    },

    /// A `ListSites` or `ListRecords` page request failed.
    #[error("failed to list {resource}: {error}")]
    List {
        /// What was being listed (`sites`, `records`)
        resource: &'static str,
        /// Underlying API failure
        error: EsaApiError,
    },

    /// `CreateRecord` failed.
    #[error("failed to create TXT record: {0}")]
    Create(EsaApiError),

    /// `DeleteRecord` failed.
    #[error("failed to delete record {record_id}: {error}")]
    Delete {
        /// ID of the record that could not be deleted
        record_id: i64,
        /// Underlying API failure
        error: EsaApiError,
    },

    /// No ESA site is named after the zone.
    #[error("site not found for domain: {zone}")]
    SiteNotFound {
        /// Zone as received on the challenge (may carry a trailing dot)
        zone: String,
    },

    /// `present`/`cleanup` was called before `initialize` installed a secret store.
    #[error("solver has not been initialized")]
    NotInitialized,
}

impl SolverError {
    /// Short machine-readable reason, used for status reasons and metric labels.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::ConfigDecode(_) => "ConfigDecodeError",
            Self::SecretNotFound { .. } => "SecretNotFound",
            Self::SecretKeyNotFound { .. } => "SecretKeyNotFound",
            Self::SecretLookup { .. } => "SecretLookupError",
            Self::Credential { .. } => "CredentialError",
            Self::ClientInit { .. } => "ClientInitError",
            Self::List { .. } => "ListError",
            Self::Create(_) => "CreateError",
            Self::Delete { .. } => "DeleteError",
            Self::SiteNotFound { .. } => "SiteNotFound",
            Self::NotInitialized => "NotInitialized",
        }
    }
}

/// Failures of a single ESA API call.
#[derive(Error, Debug, Clone)]
pub enum EsaApiError {
    /// The request never produced an HTTP response (connect, TLS, timeout).
    #[error("{action} request failed: {reason}")]
    Transport {
        /// ESA action name (e.g. `ListSites`)
        action: String,
        /// Transport error text
        reason: String,
    },

    /// ESA answered with a structured error (`Code` + `Message`).
    #[error("{action} failed with {code}: {message} (HTTP {status})")]
    Api {
        /// ESA action name
        action: String,
        /// HTTP status code
        status: u16,
        /// ESA error code (e.g. `InvalidAccessKeyId.NotFound`)
        code: String,
        /// ESA error message
        message: String,
        /// `RequestId` for support tickets, when present
        request_id: Option<String>,
    },

    /// Non-success HTTP status without a parseable error body.
    #[error("{action} returned HTTP {status}: {body}")]
    Http {
        /// ESA action name
        action: String,
        /// HTTP status code
        status: u16,
        /// Raw (truncated) body
        body: String,
    },

    /// The response body did not match the expected shape.
    #[error("failed to decode {action} response: {reason}")]
    Decode {
        /// ESA action name
        action: String,
        /// Decoder error text
        reason: String,
    },

    /// Request parameters could not be encoded.
    #[error("failed to encode {action} request: {reason}")]
    Encode {
        /// ESA action name
        action: String,
        /// Encoder error text
        reason: String,
    },
}

impl EsaApiError {
    /// ESA error code, when the API returned one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
