// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # esa-webhook - cert-manager DNS-01 solver for Alibaba Cloud ESA
//!
//! esa-webhook is a cert-manager webhook that answers ACME DNS-01 challenges
//! by publishing and removing TXT records on Alibaba Cloud ESA (Edge Security
//! Acceleration).
//!
//! ## Overview
//!
//! For every challenge the solver:
//!
//! - Decodes the solver configuration attached to the `Issuer`
//! - Resolves the AccessKey pair from Kubernetes secrets
//! - Maps the zone to its ESA site ID (paginated `ListSites`)
//! - Creates the TXT record, or deletes the one carrying the challenge key
//!
//! Records are matched by name *and* value, so concurrent challenges for the
//! same name (wildcard plus apex) never remove each other's records.
//!
//! ## Modules
//!
//! - [`challenge`] - `ChallengePayload` wire types
//! - [`config`] - Solver configuration schema
//! - [`secrets`] - Credential lookup from Kubernetes secrets
//! - [`esa`] - Signed ESA API client
//! - [`sites`] - Zone to site ID resolution
//! - [`records`] - TXT record create and delete
//! - [`solver`] - The `Solver` contract and the ESA solver
//! - [`webhook`] - HTTP surface and solver registry
//!
//! ## Example
//!
//! ```rust,no_run
//! use esa_webhook::solver::{EsaSolver, Solver};
//! use esa_webhook::webhook::{build_router, serve, SolverRegistry, WebhookState};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut registry = SolverRegistry::new();
//! registry.register(Arc::new(EsaSolver::new()))?;
//!
//! let (_stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! registry
//!     .initialize_all(&kube::Config::infer().await?, &stop_rx)
//!     .await?;
//!
//! let router = build_router(Arc::new(WebhookState::new("acme.example.com", registry)));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8443").await?;
//! serve(listener, router, stop_rx).await?;
//! # Ok(())
//! # }
//! ```

pub mod challenge;
pub mod config;
pub mod constants;
pub mod errors;
pub mod esa;
pub mod metrics;
pub mod pagination;
pub mod records;
pub mod secrets;
pub mod sites;
pub mod solver;
pub mod webhook;
