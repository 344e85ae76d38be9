// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ACS3-HMAC-SHA256 request signing for Alibaba Cloud OpenAPI.
//!
//! Reference: <https://www.alibabacloud.com/help/en/sdk/product-overview/v3-request-structure-and-signature>
//!
//! RPC-style requests carry all parameters in the query string and an empty
//! body, so the payload hash is always [`EMPTY_BODY_SHA256`].

use super::credential::AccessKeyCredential;
use crate::constants::{EMPTY_BODY_SHA256, ESA_API_VERSION};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use tracing::trace;

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm name
pub const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

/// Headers covered by the signature, in canonical order
pub const SIGNED_HEADERS: &str =
    "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";

/// Inputs that vary per request.
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    /// HTTP method
    pub method: &'a str,
    /// `host` header value (with port when non-default)
    pub host: &'a str,
    /// ESA action
    pub action: &'a str,
    /// Canonical query string
    pub query_string: &'a str,
    /// `x-acs-date`, `%Y-%m-%dT%H:%M:%SZ`
    pub timestamp: &'a str,
    /// `x-acs-signature-nonce`
    pub nonce: &'a str,
}

/// Build the canonical request string.
#[must_use]
pub fn canonical_request(input: &SigningInput<'_>) -> String {
    let SigningInput {
        method,
        host,
        action,
        query_string,
        timestamp,
        nonce,
    } = input;

    let canonical_headers = format!(
        "host:{host}\nx-acs-action:{action}\nx-acs-content-sha256:{EMPTY_BODY_SHA256}\nx-acs-date:{timestamp}\nx-acs-signature-nonce:{nonce}\nx-acs-version:{ESA_API_VERSION}\n"
    );

    format!("{method}\n/\n{query_string}\n{canonical_headers}\n{SIGNED_HEADERS}\n{EMPTY_BODY_SHA256}")
}

/// Compute the `Authorization` header value.
///
/// # Errors
///
/// Returns an error if the HMAC cannot be keyed with the secret.
pub fn authorization(
    credential: &AccessKeyCredential,
    input: &SigningInput<'_>,
) -> Result<String, hmac::digest::InvalidLength> {
    let canonical = canonical_request(input);
    trace!(canonical_request = %canonical, "ACS3 canonical request");

    let hashed_canonical_request = hex::encode(Sha256::digest(canonical.as_bytes()));
    let string_to_sign = format!("{SIGNATURE_ALGORITHM}\n{hashed_canonical_request}");

    let mut mac = HmacSha256::new_from_slice(credential.access_key_secret().as_bytes())?;
    mac.update(string_to_sign.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!(
        "{SIGNATURE_ALGORITHM} Credential={},SignedHeaders={SIGNED_HEADERS},Signature={signature}",
        credential.access_key_id()
    ))
}

#[cfg(test)]
#[path = "sign_tests.rs"]
mod sign_tests;
