// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ESA webhook.
//!
//! All metrics use the namespace prefix `esa_webhook_`.
//!
//! # Metrics Categories
//!
//! - **Challenge Metrics** - Track `present`/`cleanup` calls and their outcomes
//! - **ESA API Metrics** - Track outbound ESA API calls by action
//!
//! # Example
//!
//! ```rust,no_run
//! use esa_webhook::metrics::record_challenge_success;
//!
//! // Record a successful presentation
//! record_challenge_success("present", std::time::Duration::from_secs(1));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all webhook metrics
const METRICS_NAMESPACE: &str = "esa_webhook";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Challenge Metrics
// ============================================================================

/// Total number of challenge calls by action and status
///
/// Labels:
/// - `action`: `present` or `cleanup`
/// - `status`: Outcome (`success`, `error`)
pub static CHALLENGES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_challenges_total"),
        "Total number of challenge calls by action and status",
    );
    let counter = CounterVec::new(opts, &["action", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of challenge calls in seconds
///
/// Labels:
/// - `action`: `present` or `cleanup`
pub static CHALLENGE_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_challenge_duration_seconds"),
        "Duration of challenge calls in seconds by action",
    )
    .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["action"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

// ============================================================================
// ESA API Metrics
// ============================================================================

/// Total number of ESA API calls by action and status
///
/// Labels:
/// - `api_action`: ESA action (`ListSites`, `CreateRecord`, ...)
/// - `status`: Outcome (`success`, `error`)
pub static ESA_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_esa_requests_total"),
        "Total number of ESA API calls by action and status",
    );
    let counter = CounterVec::new(opts, &["api_action", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Helper Functions
// ============================================================================

/// Record a successful challenge call
///
/// # Arguments
/// * `action` - `present` or `cleanup`
/// * `duration` - Time taken
pub fn record_challenge_success(action: &str, duration: Duration) {
    CHALLENGES_TOTAL
        .with_label_values(&[action, "success"])
        .inc();
    CHALLENGE_DURATION_SECONDS
        .with_label_values(&[action])
        .observe(duration.as_secs_f64());
}

/// Record a failed challenge call
///
/// # Arguments
/// * `action` - `present` or `cleanup`
/// * `duration` - Time taken before failure
pub fn record_challenge_error(action: &str, duration: Duration) {
    CHALLENGES_TOTAL.with_label_values(&[action, "error"]).inc();
    CHALLENGE_DURATION_SECONDS
        .with_label_values(&[action])
        .observe(duration.as_secs_f64());
}

/// Record one ESA API call
pub fn record_esa_request(api_action: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    ESA_REQUESTS_TOTAL
        .with_label_values(&[api_action, status])
        .inc();
}

/// Gather all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if metrics encoding fails.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    // Touch the lazies so every family is exported from the first scrape
    LazyLock::force(&CHALLENGES_TOTAL);
    LazyLock::force(&CHALLENGE_DURATION_SECONDS);
    LazyLock::force(&ESA_REQUESTS_TOTAL);

    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
