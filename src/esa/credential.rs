// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Static AccessKey credentials and client construction.
//!
//! Only the long-lived AccessKey scheme is supported: an AccessKey ID and
//! secret resolved from Kubernetes secrets. STS tokens and RAM role
//! assumption are not.

use super::EsaClient;
use crate::constants::ESA_ENDPOINT_TEMPLATE;
use crate::errors::SolverError;
use std::fmt;

/// Alibaba Cloud AccessKey pair.
///
/// The secret half is never printed; [`fmt::Debug`] redacts it.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKeyCredential {
    access_key_id: String,
    access_key_secret: String,
}

impl AccessKeyCredential {
    /// Validate and wrap an AccessKey pair.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Credential`] if either half is empty or contains
    /// whitespace or control characters.
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Result<Self, SolverError> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        validate_part("access key id", &access_key_id)?;
        validate_part("access key secret", &access_key_secret)?;

        Ok(Self {
            access_key_id,
            access_key_secret,
        })
    }

    /// Build a credential from raw secret bytes.
    ///
    /// Values are decoded as UTF-8 and surrounding whitespace is trimmed, since
    /// secrets created from files or `echo` usually end with a newline.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Credential`] if either value is not UTF-8 or is
    /// rejected by [`AccessKeyCredential::new`].
    pub fn from_secret_bytes(
        access_key_id: &[u8],
        access_key_secret: &[u8],
    ) -> Result<Self, SolverError> {
        let id = decode_part("access key id", access_key_id)?;
        let secret = decode_part("access key secret", access_key_secret)?;
        Self::new(id.trim(), secret.trim())
    }

    /// The AccessKey ID (safe to log).
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub(crate) fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }
}

impl fmt::Debug for AccessKeyCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeyCredential")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

fn decode_part<'a>(what: &str, bytes: &'a [u8]) -> Result<&'a str, SolverError> {
    std::str::from_utf8(bytes).map_err(|e| SolverError::Credential {
        reason: format!("{what} is not valid UTF-8: {e}"),
    })
}

fn validate_part(what: &str, value: &str) -> Result<(), SolverError> {
    if value.is_empty() {
        return Err(SolverError::Credential {
            reason: format!("{what} is empty"),
        });
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(SolverError::Credential {
            reason: format!("{what} contains whitespace or control characters"),
        });
    }
    Ok(())
}

/// Derive the regional ESA endpoint hostname.
///
/// ```rust
/// use esa_webhook::esa::credential::endpoint_for_region;
///
/// assert_eq!(endpoint_for_region("cn-hangzhou").unwrap(), "esa.cn-hangzhou.aliyuncs.com");
/// assert!(endpoint_for_region("").is_err());
/// ```
///
/// # Errors
///
/// Returns [`SolverError::ClientInit`] if the region is empty or is not a
/// valid hostname label (lowercase letters, digits, inner hyphens).
pub fn endpoint_for_region(region: &str) -> Result<String, SolverError> {
    let valid = !region.is_empty()
        && !region.starts_with('-')
        && !region.ends_with('-')
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !valid {
        return Err(SolverError::ClientInit {
            reason: format!("invalid region ID {region:?}"),
        });
    }

    Ok(ESA_ENDPOINT_TEMPLATE.replace("{region}", region))
}

/// Build an authenticated ESA client from resolved secret material.
///
/// Construction is purely local; no request is sent.
///
/// # Errors
///
/// - [`SolverError::Credential`] if the key material is rejected
/// - [`SolverError::ClientInit`] if the region is invalid or the HTTP client cannot be built
pub fn build_client(
    access_key_id: &[u8],
    access_key_secret: &[u8],
    region: &str,
) -> Result<EsaClient, SolverError> {
    let credential = AccessKeyCredential::from_secret_bytes(access_key_id, access_key_secret)?;
    EsaClient::new(credential, region)
}

#[cfg(test)]
#[path = "credential_tests.rs"]
mod credential_tests;
