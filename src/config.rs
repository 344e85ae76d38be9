// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Solver configuration decoded from the `Issuer`'s webhook `config` block.
//!
//! ```yaml
//! webhook:
//!   groupName: acme.example.com
//!   solverName: alicloud-esa-solver
//!   config:
//!     regionId: cn-hangzhou
//!     accessKeyIdSecretRef:
//!       name: alicloud-credentials
//!       key: access-key-id
//!     accessKeySecretSecretRef:
//!       name: alicloud-credentials
//!       key: access-key-secret
//! ```
//!
//! Decoding is lenient: unknown fields are ignored and missing fields take
//! their zero value, so an `Issuer` written for a newer solver version still
//! decodes.

use crate::errors::SolverError;
use serde::{Deserialize, Serialize};

/// Reference to one key of a secret in the challenge's resource namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name
    #[serde(default)]
    pub name: String,

    /// Key inside the secret's `data`
    #[serde(default)]
    pub key: String,
}

/// Typed form of the opaque solver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Secret holding the Alibaba Cloud AccessKey ID
    #[serde(default, rename = "accessKeyIdSecretRef")]
    pub access_key_id: SecretKeySelector,

    /// Secret holding the Alibaba Cloud AccessKey secret
    #[serde(default, rename = "accessKeySecretSecretRef")]
    pub access_key_secret: SecretKeySelector,

    /// ESA region (e.g. `cn-hangzhou`, `ap-southeast-1`)
    #[serde(default)]
    pub region_id: String,
}

/// Decode the opaque configuration into a [`ProviderConfig`].
///
/// An absent or `null` configuration yields the zero-valued config.
///
/// # Errors
///
/// Returns [`SolverError::ConfigDecode`] when the value does not match the schema.
pub fn load_config(raw: Option<&serde_json::Value>) -> Result<ProviderConfig, SolverError> {
    match raw {
        None | Some(serde_json::Value::Null) => Ok(ProviderConfig::default()),
        Some(value) => ProviderConfig::deserialize(value).map_err(SolverError::ConfigDecode),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
