// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! ESA API request and response bodies.
//!
//! ESA is an RPC-style OpenAPI: every parameter travels in the query string,
//! sorted by name and RFC 3986 encoded. Object-valued parameters (`Data`) are
//! JSON-encoded into a single query parameter. Responses are JSON with
//! PascalCase field names; every field is optional on the wire.

use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Write;

// ============================================================================
// Query String Encoding
// ============================================================================

/// RFC 3986 percent-encoding (unreserved characters pass through).
#[must_use]
pub fn percent_encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(char::from(byte));
            }
            _ => {
                let _ = write!(result, "%{byte:02X}");
            }
        }
    }
    result
}

/// Flatten a JSON value into dotted RPC parameter names.
///
/// Arrays are 1-indexed (`Tags.1`, `Tags.2`); nulls are dropped.
pub fn flatten_params(prefix: &str, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_params(&name, child, out);
            }
        }
        serde_json::Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_params(&format!("{prefix}.{}", index + 1), child, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_json::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_json::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        serde_json::Value::Null => {}
    }
}

/// Serialize request parameters into the canonical (sorted, encoded) query string.
///
/// # Errors
///
/// Returns the serializer error if `params` cannot be represented as JSON.
pub fn to_query_string<T: Serialize>(params: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(params)?;

    let mut flat = BTreeMap::new();
    flatten_params("", &value, &mut flat);

    Ok(flat
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&"))
}

/// Encode an object parameter as a single JSON string parameter.
fn as_json_string<T: Serialize, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    let encoded = serde_json::to_string(value).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&encoded)
}

// ============================================================================
// Shared Structures
// ============================================================================

/// Record payload. For TXT records only `Value` is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordData {
    /// Record value (the TXT content)
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Pagination counters echoed by list responses.
pub trait Paginated {
    /// `PageNumber` of this response
    fn page_number(&self) -> Option<u32>;
    /// `PageSize` of this response
    fn page_size(&self) -> Option<u32>;
    /// `TotalCount` across all pages
    fn total_count(&self) -> Option<u32>;
}

/// Structured error body returned on failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorResponse {
    /// Request ID
    #[serde(default)]
    pub request_id: Option<String>,
    /// Error code (e.g. `Throttling.User`)
    #[serde(default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Site Structures
// ============================================================================

/// `ListSites` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSitesRequest {
    /// 1-based page number
    pub page_number: u32,
    /// Items per page
    pub page_size: u32,
}

/// `ListSites` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListSitesResponse {
    /// Request ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Page returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Page size used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Total number of sites
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u32>,
    /// Sites on this page
    #[serde(default)]
    pub sites: Vec<Site>,
}

impl Paginated for ListSitesResponse {
    fn page_number(&self) -> Option<u32> {
        self.page_number
    }

    fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    fn total_count(&self) -> Option<u32> {
        self.total_count
    }
}

/// One ESA site (a hosted zone).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Site {
    /// Numeric site ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_id: Option<i64>,
    /// Site name; the zone without trailing dot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Site status (`active`, `pending`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// ============================================================================
// Record Structures
// ============================================================================

/// `CreateRecord` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRecordRequest {
    /// Site the record is created under
    pub site_id: i64,
    /// Full record name without trailing dot
    pub record_name: String,
    /// Record type
    #[serde(rename = "Type")]
    pub record_type: String,
    /// TTL in seconds
    pub ttl: u32,
    /// Record payload, sent as a JSON string parameter
    #[serde(serialize_with = "as_json_string")]
    pub data: RecordData,
}

/// `CreateRecord` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateRecordResponse {
    /// Request ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// ID of the created record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
}

/// `ListRecords` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRecordsRequest {
    /// Site to list records of
    pub site_id: i64,
    /// Record name filter
    pub record_name: String,
    /// How `RecordName` is matched (`exact`, `fuzzy`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_match_type: Option<String>,
    /// Record type filter
    #[serde(rename = "Type")]
    pub record_type: String,
    /// 1-based page number
    pub page_number: u32,
    /// Items per page
    pub page_size: u32,
}

/// `ListRecords` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRecordsResponse {
    /// Request ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Page returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// Page size used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Total number of matching records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u32>,
    /// Records on this page
    #[serde(default)]
    pub records: Vec<Record>,
}

impl Paginated for ListRecordsResponse {
    fn page_number(&self) -> Option<u32> {
        self.page_number
    }

    fn page_size(&self) -> Option<u32> {
        self.page_size
    }

    fn total_count(&self) -> Option<u32> {
        self.total_count
    }
}

/// One DNS record hosted under a site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    /// Record ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,
    /// Full record name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_name: Option<String>,
    /// Record type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    /// Record payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<RecordData>,
    /// TTL in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
}

impl Record {
    /// Record value, if the payload carries one.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.value.as_deref())
    }
}

/// `DeleteRecord` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRecordRequest {
    /// Record to delete
    pub record_id: i64,
}

/// `DeleteRecord` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteRecordResponse {
    /// Request ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
