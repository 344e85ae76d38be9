// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TXT record management for challenge records.
//!
//! Records are identified by name *and* value: several challenges for the
//! same FQDN (wildcard plus apex, renewals overlapping) publish distinct TXT
//! values under one name, and cleaning up one must never remove another.

use crate::constants::{CHALLENGE_RECORD_TTL_SECS, ESA_PAGE_SIZE, TXT_RECORD_TYPE};
use crate::errors::SolverError;
use crate::esa::types::{CreateRecordRequest, DeleteRecordRequest, ListRecordsRequest, RecordData};
use crate::esa::DnsApi;
use crate::pagination::next_page;
use tracing::{debug, info};

/// `RecordMatchType` asking ESA for exact name matches
const RECORD_MATCH_EXACT: &str = "exact";

/// Create a TXT record `name` with `value` under `site_id`.
///
/// No pre-check for an existing record is made. Repeating the call with the
/// same name and value either adds a duplicate or is rejected by ESA; both are
/// acceptable to the caller.
///
/// # Errors
///
/// Returns [`SolverError::Create`] if the call fails.
pub async fn create_txt_record(
    api: &dyn DnsApi,
    site_id: i64,
    name: &str,
    value: &str,
) -> Result<(), SolverError> {
    let response = api
        .create_record(&CreateRecordRequest {
            site_id,
            record_name: name.to_string(),
            record_type: TXT_RECORD_TYPE.to_string(),
            ttl: CHALLENGE_RECORD_TTL_SECS,
            data: RecordData {
                value: Some(value.to_string()),
            },
        })
        .await
        .map_err(SolverError::Create)?;

    info!(
        site_id = site_id,
        record_name = %name,
        record_id = ?response.record_id,
        "Created TXT record"
    );
    Ok(())
}

/// Delete the TXT record `name` whose value equals `value`.
///
/// Records are listed page by page; the first exact value match is deleted
/// and scanning stops. Finding no match is success, so clean-up can be
/// repeated or run after a failed presentation.
///
/// # Errors
///
/// - [`SolverError::List`] if a page request fails
/// - [`SolverError::Delete`] if the delete call fails
pub async fn delete_txt_record(
    api: &dyn DnsApi,
    site_id: i64,
    name: &str,
    value: &str,
) -> Result<(), SolverError> {
    let mut page_number = 1;

    loop {
        let response = api
            .list_records(&ListRecordsRequest {
                site_id,
                record_name: name.to_string(),
                record_match_type: Some(RECORD_MATCH_EXACT.to_string()),
                record_type: TXT_RECORD_TYPE.to_string(),
                page_number,
                page_size: ESA_PAGE_SIZE,
            })
            .await
            .map_err(|error| SolverError::List {
                resource: "records",
                error,
            })?;

        debug!(
            site_id = site_id,
            record_name = %name,
            page = page_number,
            records_in_page = response.records.len(),
            "Fetched page of TXT records"
        );

        let matched = response
            .records
            .iter()
            .filter(|record| record.value() == Some(value))
            .find_map(|record| record.record_id);

        if let Some(record_id) = matched {
            api.delete_record(&DeleteRecordRequest { record_id })
                .await
                .map_err(|error| SolverError::Delete { record_id, error })?;

            info!(
                site_id = site_id,
                record_name = %name,
                record_id = record_id,
                "Deleted TXT record"
            );
            return Ok(());
        }

        match next_page(&response, page_number) {
            Some(next) => page_number = next,
            None => break,
        }
    }

    info!(
        site_id = site_id,
        record_name = %name,
        "No TXT record with matching value, nothing to delete"
    );
    Ok(())
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
