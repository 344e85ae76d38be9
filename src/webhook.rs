// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP surface routing challenge payloads to registered solvers.
//!
//! cert-manager reaches the webhook through the Kubernetes API aggregation
//! layer, which forwards `POST /apis/{group}/v1alpha1/{solver}` with a
//! `ChallengePayload` body. Every answer carries a `ChallengePayload` whose
//! `response` reports success or the failure message; HTTP error codes are
//! reserved for requests that never reach a solver.
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `POST` | `/apis/{group}/v1alpha1/{solver}` | Present or clean up a challenge |
//! | `GET` | `/apis/{group}/v1alpha1` | Discovery (`APIResourceList`) |
//! | `GET` | `/healthz` | Liveness |
//! | `GET` | `/metrics` | Prometheus exposition |
//!
//! TLS is terminated in front of the process.

use crate::challenge::{ChallengeAction, ChallengePayload, ChallengeResponse};
use crate::constants::{CHALLENGE_PAYLOAD_KIND, WEBHOOK_API_VERSION};
use crate::errors::SolverError;
use crate::metrics::gather_metrics;
use crate::solver::Solver;
use anyhow::{bail, Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList, Status};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Solvers served by one webhook, keyed by [`Solver::name`].
#[derive(Default, Clone)]
pub struct SolverRegistry {
    solvers: BTreeMap<String, Arc<dyn Solver>>,
}

impl SolverRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a solver.
    ///
    /// # Errors
    ///
    /// Returns an error if a solver with the same name is already registered.
    pub fn register(&mut self, solver: Arc<dyn Solver>) -> Result<()> {
        let name = solver.name().to_string();
        if self.solvers.contains_key(&name) {
            bail!("solver {name:?} is already registered");
        }
        debug!(solver = %name, "Registered solver");
        self.solvers.insert(name, solver);
        Ok(())
    }

    /// Look up a solver by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Solver>> {
        self.solvers.get(name).cloned()
    }

    /// Registered solver names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.solvers.keys().map(String::as_str).collect()
    }

    /// Initialize every registered solver.
    ///
    /// # Errors
    ///
    /// Returns the first solver's initialization error.
    pub async fn initialize_all(
        &self,
        kube_config: &kube::Config,
        stop: &watch::Receiver<bool>,
    ) -> Result<()> {
        for (name, solver) in &self.solvers {
            solver
                .initialize(kube_config.clone(), stop.clone())
                .await
                .with_context(|| format!("failed to initialize solver {name:?}"))?;
        }
        Ok(())
    }
}

/// Shared state of the HTTP handlers.
pub struct WebhookState {
    group_name: String,
    registry: SolverRegistry,
}

impl WebhookState {
    #[must_use]
    pub fn new(group_name: impl Into<String>, registry: SolverRegistry) -> Self {
        Self {
            group_name: group_name.into(),
            registry,
        }
    }
}

/// Build the webhook router.
pub fn build_router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/apis/{group}/{version}", get(discovery))
        .route("/apis/{group}/{version}/{solver}", post(challenge))
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

/// Serve `router` on `listener` until `stop` flips to `true`.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut stop: watch::Receiver<bool>,
) -> Result<()> {
    let local_addr = listener.local_addr().context("listener has no local address")?;
    info!(address = %local_addr, "Webhook listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            // A dropped sender also means shutdown
            let _ = stop.wait_for(|stopping| *stopping).await;
            info!("Webhook shutting down");
        })
        .await
        .context("webhook server failed")
}

fn status_response(code: StatusCode, reason: &str, message: String) -> Response {
    let status = Status {
        status: Some("Failure".to_string()),
        code: Some(i32::from(code.as_u16())),
        reason: Some(reason.to_string()),
        message: Some(message),
        ..Default::default()
    };
    (code, Json(status)).into_response()
}

fn check_route(state: &WebhookState, group: &str, version: &str) -> Result<(), Response> {
    if group != state.group_name || version != WEBHOOK_API_VERSION {
        return Err(status_response(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("no API served at /apis/{group}/{version}"),
        ));
    }
    Ok(())
}

async fn challenge(
    State(state): State<Arc<WebhookState>>,
    Path((group, version, solver_name)): Path<(String, String, String)>,
    payload: Result<Json<ChallengePayload>, JsonRejection>,
) -> Response {
    if let Err(response) = check_route(&state, &group, &version) {
        return response;
    }

    let Some(solver) = state.registry.get(&solver_name) else {
        warn!(solver = %solver_name, "Challenge for unknown solver");
        return status_response(
            StatusCode::NOT_FOUND,
            "NotFound",
            format!("no solver named {solver_name:?}"),
        );
    };

    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(solver = %solver_name, error = %rejection.body_text(), "Rejected challenge body");
            return status_response(rejection.status(), "BadRequest", rejection.body_text());
        }
    };

    let Some(request) = payload.request else {
        return status_response(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            "challenge payload has no request".to_string(),
        );
    };

    debug!(
        uid = %request.uid,
        solver = %solver_name,
        action = request.action.as_str(),
        "Dispatching challenge"
    );

    let result = match request.action {
        ChallengeAction::Present => solver.present(&request).await,
        ChallengeAction::CleanUp => solver.cleanup(&request).await,
    };

    let response = match result {
        Ok(()) => ChallengeResponse::success(&request.uid),
        Err(e) => {
            let reason = e
                .downcast_ref::<SolverError>()
                .map_or("InternalError", SolverError::reason);
            ChallengeResponse::failure(&request.uid, reason, format!("{e:#}"))
        }
    };

    Json(ChallengePayload::with_response(response)).into_response()
}

async fn discovery(
    State(state): State<Arc<WebhookState>>,
    Path((group, version)): Path<(String, String)>,
) -> Response {
    if let Err(response) = check_route(&state, &group, &version) {
        return response;
    }

    let resources = state
        .registry
        .names()
        .into_iter()
        .map(|name| APIResource {
            name: name.to_string(),
            singular_name: name.to_string(),
            namespaced: false,
            group: Some(group.clone()),
            version: Some(version.clone()),
            kind: CHALLENGE_PAYLOAD_KIND.to_string(),
            verbs: vec!["create".to_string()],
            ..Default::default()
        })
        .collect();

    Json(APIResourceList {
        group_version: format!("{group}/{version}"),
        resources,
    })
    .into_response()
}

async fn healthz() -> &'static str {
    "ok"
}

async fn metrics() -> Response {
    match gather_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to gather metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
#[path = "webhook_tests.rs"]
mod webhook_tests;
