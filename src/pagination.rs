// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for ESA list operations.
//!
//! ESA list calls are page-number based: each response echoes `PageNumber`
//! and `PageSize` and reports `TotalCount`. Enumeration continues while
//! `PageNumber * PageSize < TotalCount` and stops immediately when any of the
//! three counters is missing.

use crate::esa::types::Paginated;
use tracing::debug;

/// Page number to request after `response`, or `None` when enumeration is done.
///
/// `requested` is the page number that produced `response`. Enumeration also
/// stops when the server reports a zero page size or echoes a page number
/// that would not move past `requested`, so a misbehaving server cannot
/// cause an endless loop.
///
/// # Example
///
/// ```rust
/// use esa_webhook::esa::types::ListSitesResponse;
/// use esa_webhook::pagination::next_page;
///
/// let page = ListSitesResponse {
///     page_number: Some(1),
///     page_size: Some(100),
///     total_count: Some(250),
///     ..Default::default()
/// };
/// assert_eq!(next_page(&page, 1), Some(2));
/// ```
#[must_use]
pub fn next_page<P: Paginated>(response: &P, requested: u32) -> Option<u32> {
    let (Some(page_number), Some(page_size), Some(total_count)) = (
        response.page_number(),
        response.page_size(),
        response.total_count(),
    ) else {
        debug!(page = requested, "Response carries no pagination counters, stopping");
        return None;
    };

    if page_size == 0 {
        debug!(page = requested, "Response reports zero page size, stopping");
        return None;
    }

    if u64::from(page_number) * u64::from(page_size) >= u64::from(total_count) {
        return None;
    }

    let next = page_number.checked_add(1)?;
    if next <= requested {
        debug!(
            requested = requested,
            echoed = page_number,
            "Page number did not advance, stopping"
        );
        return None;
    }

    Some(next)
}

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod pagination_tests;
