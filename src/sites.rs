// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Site resolution: map a DNS zone to its ESA site ID.

use crate::challenge::un_fqdn;
use crate::constants::ESA_PAGE_SIZE;
use crate::errors::SolverError;
use crate::esa::types::ListSitesRequest;
use crate::esa::DnsApi;
use crate::pagination::next_page;
use tracing::{debug, warn};

/// Resolve the numeric site ID of `zone`.
///
/// Sites are listed page by page and compared by name against the zone with
/// its trailing dot stripped (exact, case-sensitive). The first match wins.
///
/// # Errors
///
/// - [`SolverError::List`] if any page request fails; there is no partial-result fallback
/// - [`SolverError::SiteNotFound`] if no site on any page matches
pub async fn resolve_site_id(api: &dyn DnsApi, zone: &str) -> Result<i64, SolverError> {
    let site_name = un_fqdn(zone);
    let mut page_number = 1;

    loop {
        let response = api
            .list_sites(&ListSitesRequest {
                page_number,
                page_size: ESA_PAGE_SIZE,
            })
            .await
            .map_err(|error| SolverError::List {
                resource: "sites",
                error,
            })?;

        debug!(
            page = page_number,
            sites_in_page = response.sites.len(),
            total_count = ?response.total_count,
            "Fetched page of ESA sites"
        );

        for site in &response.sites {
            if site.site_name.as_deref() != Some(site_name) {
                continue;
            }
            match site.site_id {
                Some(site_id) => {
                    debug!(site_name = %site_name, site_id = site_id, "Resolved ESA site");
                    return Ok(site_id);
                }
                None => warn!(site_name = %site_name, "Matching site has no SiteId, skipping"),
            }
        }

        match next_page(&response, page_number) {
            Some(next) => page_number = next,
            None => break,
        }
    }

    Err(SolverError::SiteNotFound {
        zone: zone.to_string(),
    })
}

#[cfg(test)]
#[path = "sites_tests.rs"]
mod sites_tests;
