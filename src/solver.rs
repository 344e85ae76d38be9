// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Challenge solvers.
//!
//! [`Solver`] is the contract the webhook host drives: a stable name, a
//! one-time [`Solver::initialize`] with cluster access, and the two challenge
//! operations. [`EsaSolver`] implements it for Alibaba Cloud ESA.
//!
//! # Present
//!
//! 1. Decode the solver configuration
//! 2. Resolve the AccessKey pair from secrets in the request namespace
//! 3. Build an ESA client for the configured region
//! 4. Resolve the site ID of the zone
//! 5. Create the TXT record `resolvedFQDN` (no trailing dot) = `key`
//!
//! # CleanUp
//!
//! Steps 1 to 4 as above, then delete the TXT record whose value equals `key`.
//! A missing record is not an error.
//!
//! No ESA client is kept between calls. Each operation builds its own from
//! the secrets it resolves, so concurrent challenges on one solver never
//! share mutable state.

use crate::challenge::{ChallengeAction, ChallengeRequest};
use crate::config::{load_config, ProviderConfig};
use crate::constants::SOLVER_NAME;
use crate::errors::SolverError;
use crate::esa::{ClientFactory, DnsApi, EsaClientFactory};
use crate::metrics;
use crate::records::{create_txt_record, delete_txt_record};
use crate::secrets::{resolve_secret_key, KubeSecretStore, SecretStore};
use crate::sites::resolve_site_id;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// A DNS-01 challenge solver.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Stable identifier, used to route challenge payloads to this solver.
    fn name(&self) -> &str;

    /// Prepare cluster access. Called once at startup, before any challenge.
    ///
    /// `stop` flips to `true` when the process is shutting down.
    ///
    /// # Errors
    ///
    /// Returns an error if the solver cannot be made ready; the process
    /// should not start serving.
    async fn initialize(&self, kube_config: kube::Config, stop: watch::Receiver<bool>)
        -> Result<()>;

    /// Publish the challenge record. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, wrapped with a step description.
    async fn present(&self, request: &ChallengeRequest) -> Result<()>;

    /// Remove the challenge record. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error, wrapped with a step description.
    async fn cleanup(&self, request: &ChallengeRequest) -> Result<()>;
}

/// [`Solver`] for Alibaba Cloud ESA.
pub struct EsaSolver {
    secrets: OnceLock<Arc<dyn SecretStore>>,
    clients: Arc<dyn ClientFactory>,
}

impl Default for EsaSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EsaSolver {
    /// Solver talking to the public regional ESA endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client_factory(Arc::new(EsaClientFactory::new()))
    }

    /// Solver building its ESA handles with `clients`.
    #[must_use]
    pub fn with_client_factory(clients: Arc<dyn ClientFactory>) -> Self {
        Self {
            secrets: OnceLock::new(),
            clients,
        }
    }

    /// Install a secret store up front; [`Solver::initialize`] then keeps it.
    #[must_use]
    pub fn with_secret_store(self, store: Arc<dyn SecretStore>) -> Self {
        // Freshly constructed, so the cell is empty
        let _ = self.secrets.set(store);
        self
    }

    fn secret_store(&self) -> Result<&dyn SecretStore, SolverError> {
        self.secrets
            .get()
            .map(|store| &**store)
            .ok_or(SolverError::NotInitialized)
    }

    /// Resolve credentials and build a fresh ESA handle for one call.
    async fn ensure_client(
        &self,
        config: &ProviderConfig,
        namespace: &str,
    ) -> Result<Arc<dyn DnsApi>> {
        let store = self.secret_store()?;

        let access_key_id = resolve_secret_key(store, &config.access_key_id, namespace)
            .await
            .context("failed to get access key id")?;
        let access_key_secret = resolve_secret_key(store, &config.access_key_secret, namespace)
            .await
            .context("failed to get access key secret")?;

        let client = self
            .clients
            .build(&access_key_id, &access_key_secret, &config.region_id)
            .context("failed to create ESA client")?;
        Ok(client)
    }

    async fn run_present(&self, request: &ChallengeRequest) -> Result<()> {
        let config = load_config(request.config.as_ref()).context("failed to load solver config")?;
        debug!(config = ?config, "Decoded solver config");

        let client = self
            .ensure_client(&config, &request.resource_namespace)
            .await?;

        let site_id = resolve_site_id(client.as_ref(), &request.resolved_zone)
            .await
            .context("failed to get site ID")?;

        create_txt_record(client.as_ref(), site_id, &request.record_name(), &request.key)
            .await
            .context("failed to create TXT record")?;

        Ok(())
    }

    async fn run_cleanup(&self, request: &ChallengeRequest) -> Result<()> {
        let config = load_config(request.config.as_ref()).context("failed to load solver config")?;
        debug!(config = ?config, "Decoded solver config");

        let client = self
            .ensure_client(&config, &request.resource_namespace)
            .await?;

        let site_id = resolve_site_id(client.as_ref(), &request.resolved_zone)
            .await
            .context("failed to get site ID")?;

        delete_txt_record(client.as_ref(), site_id, &request.record_name(), &request.key)
            .await
            .context("failed to delete TXT record")?;

        Ok(())
    }
}

/// Log and count the outcome of one challenge call.
fn observe(action: ChallengeAction, request: &ChallengeRequest, start: Instant, result: &Result<()>) {
    let duration = start.elapsed();
    match result {
        Ok(()) => {
            metrics::record_challenge_success(action.as_str(), duration);
            info!(
                uid = %request.uid,
                action = action.as_str(),
                fqdn = %request.resolved_fqdn,
                duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                "Challenge call succeeded"
            );
        }
        Err(e) => {
            metrics::record_challenge_error(action.as_str(), duration);
            error!(
                uid = %request.uid,
                action = action.as_str(),
                fqdn = %request.resolved_fqdn,
                error = %format!("{e:#}"),
                "Challenge call failed"
            );
        }
    }
}

#[async_trait]
impl Solver for EsaSolver {
    fn name(&self) -> &str {
        SOLVER_NAME
    }

    async fn initialize(
        &self,
        kube_config: kube::Config,
        _stop: watch::Receiver<bool>,
    ) -> Result<()> {
        // No background work is started, so `stop` is unused
        if self.secrets.get().is_some() {
            debug!(solver = SOLVER_NAME, "Secret store already installed");
        } else {
            let client = kube::Client::try_from(kube_config)
                .context("failed to create Kubernetes client")?;
            let store: Arc<dyn SecretStore> = Arc::new(KubeSecretStore::new(client));
            // A concurrent initialize may have won; either store is equivalent
            let _ = self.secrets.set(store);
        }

        info!(solver = SOLVER_NAME, "Solver initialized");
        Ok(())
    }

    async fn present(&self, request: &ChallengeRequest) -> Result<()> {
        info!(
            uid = %request.uid,
            zone = %request.resolved_zone,
            fqdn = %request.resolved_fqdn,
            namespace = %request.resource_namespace,
            "Presenting DNS-01 challenge"
        );
        let start = Instant::now();
        let result = self.run_present(request).await;
        observe(ChallengeAction::Present, request, start, &result);
        result
    }

    async fn cleanup(&self, request: &ChallengeRequest) -> Result<()> {
        info!(
            uid = %request.uid,
            zone = %request.resolved_zone,
            fqdn = %request.resolved_fqdn,
            namespace = %request.resource_namespace,
            "Cleaning up DNS-01 challenge"
        );
        let start = Instant::now();
        let result = self.run_cleanup(request).await;
        observe(ChallengeAction::CleanUp, request, start, &result);
        result
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod solver_tests;
