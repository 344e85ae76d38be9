// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Credential material lookup from Kubernetes secrets.
//!
//! The solver never reads credentials from its own environment: every
//! challenge names the secrets holding the AccessKey pair, and they are
//! fetched from the challenge's resource namespace on each call.

use crate::config::SecretKeySelector;
use crate::errors::SolverError;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use std::collections::BTreeMap;
use tracing::debug;

/// Secret data keyed by entry name.
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Key-value secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the data of secret `name` in `namespace`.
    ///
    /// Returns `Ok(None)` when the secret object does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::SecretLookup`] when the store itself fails.
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, SolverError>;
}

/// [`SecretStore`] backed by the Kubernetes API.
#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl KubeSecretStore {
    /// Wrap an existing Kubernetes client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, SolverError> {
        let secret_api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);

        let secret = secret_api
            .get_opt(name)
            .await
            .map_err(|e| SolverError::SecretLookup {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        // Convert ByteString to Vec<u8>
        Ok(secret.map(|secret| {
            secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }
}

/// In-memory [`SecretStore`] for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
pub struct InMemorySecretStore {
    secrets: std::sync::RwLock<std::collections::HashMap<(String, String), SecretData>>,
}

#[cfg(any(test, feature = "test-support"))]
impl InMemorySecretStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one secret entry.
    pub fn insert(&self, namespace: &str, name: &str, key: &str, value: impl Into<Vec<u8>>) {
        let mut secrets = self
            .secrets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.into());
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, SolverError> {
        let secrets = self
            .secrets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Ok(secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

/// Resolve one secret key to its bytes.
///
/// # Arguments
///
/// * `store` - Secret store to query
/// * `selector` - Secret name and key
/// * `namespace` - Challenge resource namespace
///
/// # Errors
///
/// - [`SolverError::SecretNotFound`] if the secret object does not exist
/// - [`SolverError::SecretKeyNotFound`] if the secret has no entry under the key
/// - [`SolverError::SecretLookup`] if the store fails
pub async fn resolve_secret_key(
    store: &dyn SecretStore,
    selector: &SecretKeySelector,
    namespace: &str,
) -> Result<Vec<u8>, SolverError> {
    debug!(
        namespace = %namespace,
        secret = %selector.name,
        key = %selector.key,
        "Resolving secret key"
    );

    let mut data = store
        .get(namespace, &selector.name)
        .await?
        .ok_or_else(|| SolverError::SecretNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        })?;

    data.remove(&selector.key)
        .ok_or_else(|| SolverError::SecretKeyNotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
            key: selector.key.clone(),
        })
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
