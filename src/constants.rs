// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the ESA webhook solver.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Webhook API Constants
// ============================================================================

/// API version under which solvers are served (`/apis/{group}/v1alpha1/{solver}`)
pub const WEBHOOK_API_VERSION: &str = "v1alpha1";

/// `apiVersion` carried by every challenge payload
pub const CHALLENGE_PAYLOAD_API_VERSION: &str = "webhook.acme.cert-manager.io/v1alpha1";

/// `kind` carried by every challenge payload
pub const CHALLENGE_PAYLOAD_KIND: &str = "ChallengePayload";

/// Name this solver is referenced by on the `Issuer` resource
pub const SOLVER_NAME: &str = "alicloud-esa-solver";

// ============================================================================
// ESA API Constants
// ============================================================================

/// ESA OpenAPI version sent in `x-acs-version`
pub const ESA_API_VERSION: &str = "2024-09-10";

/// Regional endpoint hostname template; `{region}` is replaced by the region ID
pub const ESA_ENDPOINT_TEMPLATE: &str = "esa.{region}.aliyuncs.com";

/// Page size used for `ListSites` and `ListRecords` enumeration
pub const ESA_PAGE_SIZE: u32 = 100;

/// TTL for challenge TXT records (5 minutes)
pub const CHALLENGE_RECORD_TTL_SECS: u32 = 300;

/// Record type of every record this solver creates or deletes
pub const TXT_RECORD_TYPE: &str = "TXT";

/// Timeout applied to every ESA HTTP request
pub const ESA_REQUEST_TIMEOUT_SECS: u64 = 30;

/// SHA256 of an empty request body
pub const EMPTY_BODY_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

// ============================================================================
// Process Configuration Constants
// ============================================================================

/// Environment variable naming the API group the webhook is registered under
pub const GROUP_NAME_ENV: &str = "GROUP_NAME";

/// Environment variable overriding the listen address
pub const LISTEN_ADDR_ENV: &str = "LISTEN_ADDR";

/// Default socket the HTTP surface binds
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8443";
