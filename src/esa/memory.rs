// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory ESA backend.
//!
//! [`InMemoryDnsApi`] keeps sites and records in process memory and serves
//! them with the same paging semantics as the real API. It records every call
//! and can be told to fail a given action, so the challenge protocol can be
//! exercised end to end without network access.

use super::credential::{endpoint_for_region, AccessKeyCredential};
use super::types::{
    CreateRecordRequest, CreateRecordResponse, DeleteRecordRequest, DeleteRecordResponse,
    ListRecordsRequest, ListRecordsResponse, ListSitesRequest, ListSitesResponse, Record,
    RecordData, Site,
};
use super::{ClientFactory, DnsApi};
use crate::errors::{EsaApiError, SolverError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// One call observed by [`InMemoryDnsApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    /// `ListSites` with the requested page
    ListSites { page_number: u32 },
    /// `CreateRecord`
    CreateRecord {
        site_id: i64,
        record_name: String,
        value: String,
        ttl: u32,
    },
    /// `ListRecords` with the requested page
    ListRecords {
        site_id: i64,
        record_name: String,
        page_number: u32,
    },
    /// `DeleteRecord`
    DeleteRecord { record_id: i64 },
}

#[derive(Debug, Default)]
struct State {
    sites: Vec<Site>,
    records: HashMap<i64, Vec<Record>>,
    next_record_id: i64,
    calls: Vec<ApiCall>,
    failures: HashMap<&'static str, EsaApiError>,
    omit_counters: bool,
}

/// Thread-safe in-memory [`DnsApi`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDnsApi {
    state: Arc<Mutex<State>>,
}

impl InMemoryDnsApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Register a site.
    pub fn add_site(&self, site_id: i64, site_name: &str) {
        self.lock().sites.push(Site {
            site_id: Some(site_id),
            site_name: Some(site_name.to_string()),
            status: Some("active".to_string()),
        });
    }

    /// Register a site entry without an ID.
    pub fn add_site_without_id(&self, site_name: &str) {
        self.lock().sites.push(Site {
            site_id: None,
            site_name: Some(site_name.to_string()),
            status: Some("active".to_string()),
        });
    }

    /// Seed a record directly, bypassing the call log. Returns its ID.
    pub fn seed_record(&self, site_id: i64, record_type: &str, record_name: &str, value: &str) -> i64 {
        let mut state = self.lock();
        state.next_record_id += 1;
        let record_id = state.next_record_id;
        state.records.entry(site_id).or_default().push(Record {
            record_id: Some(record_id),
            record_name: Some(record_name.to_string()),
            record_type: Some(record_type.to_string()),
            data: Some(RecordData {
                value: Some(value.to_string()),
            }),
            ttl: Some(300),
        });
        record_id
    }

    /// Make every subsequent call of `action` fail with `error`.
    pub fn fail_action(&self, action: &'static str, error: EsaApiError) {
        self.lock().failures.insert(action, error);
    }

    /// Stop failing `action`.
    pub fn clear_failure(&self, action: &'static str) {
        self.lock().failures.remove(action);
    }

    /// Omit `PageNumber`/`PageSize`/`TotalCount` from list responses.
    pub fn omit_pagination_counters(&self, omit: bool) {
        self.lock().omit_counters = omit;
    }

    /// Records currently stored under a site.
    #[must_use]
    pub fn records(&self, site_id: i64) -> Vec<Record> {
        self.lock().records.get(&site_id).cloned().unwrap_or_default()
    }

    /// TXT values currently stored under `record_name` in a site.
    #[must_use]
    pub fn txt_values(&self, site_id: i64, record_name: &str) -> Vec<String> {
        self.records(site_id)
            .iter()
            .filter(|r| {
                r.record_type.as_deref() == Some("TXT")
                    && r.record_name.as_deref() == Some(record_name)
            })
            .filter_map(|r| r.value().map(str::to_string))
            .collect()
    }

    /// Every call observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Number of `DeleteRecord` calls observed so far.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, ApiCall::DeleteRecord { .. }))
            .count()
    }

    fn check_failure(state: &State, action: &'static str) -> Result<(), EsaApiError> {
        match state.failures.get(action) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Slice one page out of `items`; `page_number` is 1-based.
fn page_of<T: Clone>(items: &[T], page_number: u32, page_size: u32) -> Vec<T> {
    if page_number == 0 || page_size == 0 {
        return Vec::new();
    }
    let start = (page_number as usize - 1).saturating_mul(page_size as usize);
    items
        .iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect()
}

fn counter(omit: bool, value: usize) -> Option<u32> {
    if omit {
        None
    } else {
        Some(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl DnsApi for InMemoryDnsApi {
    async fn list_sites(
        &self,
        request: &ListSitesRequest,
    ) -> Result<ListSitesResponse, EsaApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListSites {
            page_number: request.page_number,
        });
        Self::check_failure(&state, "ListSites")?;

        let omit = state.omit_counters;
        Ok(ListSitesResponse {
            request_id: None,
            page_number: counter(omit, request.page_number as usize),
            page_size: counter(omit, request.page_size as usize),
            total_count: counter(omit, state.sites.len()),
            sites: page_of(&state.sites, request.page_number, request.page_size),
        })
    }

    async fn create_record(
        &self,
        request: &CreateRecordRequest,
    ) -> Result<CreateRecordResponse, EsaApiError> {
        let mut state = self.lock();
        let value = request.data.value.clone().unwrap_or_default();
        state.calls.push(ApiCall::CreateRecord {
            site_id: request.site_id,
            record_name: request.record_name.clone(),
            value: value.clone(),
            ttl: request.ttl,
        });
        Self::check_failure(&state, "CreateRecord")?;

        state.next_record_id += 1;
        let record_id = state.next_record_id;
        state.records.entry(request.site_id).or_default().push(Record {
            record_id: Some(record_id),
            record_name: Some(request.record_name.clone()),
            record_type: Some(request.record_type.clone()),
            data: Some(RecordData { value: Some(value) }),
            ttl: Some(request.ttl),
        });

        Ok(CreateRecordResponse {
            request_id: None,
            record_id: Some(record_id),
        })
    }

    async fn list_records(
        &self,
        request: &ListRecordsRequest,
    ) -> Result<ListRecordsResponse, EsaApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::ListRecords {
            site_id: request.site_id,
            record_name: request.record_name.clone(),
            page_number: request.page_number,
        });
        Self::check_failure(&state, "ListRecords")?;

        let matching: Vec<Record> = state
            .records
            .get(&request.site_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        r.record_name.as_deref() == Some(request.record_name.as_str())
                            && r.record_type.as_deref() == Some(request.record_type.as_str())
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let omit = state.omit_counters;
        Ok(ListRecordsResponse {
            request_id: None,
            page_number: counter(omit, request.page_number as usize),
            page_size: counter(omit, request.page_size as usize),
            total_count: counter(omit, matching.len()),
            records: page_of(&matching, request.page_number, request.page_size),
        })
    }

    async fn delete_record(
        &self,
        request: &DeleteRecordRequest,
    ) -> Result<DeleteRecordResponse, EsaApiError> {
        let mut state = self.lock();
        state.calls.push(ApiCall::DeleteRecord {
            record_id: request.record_id,
        });
        Self::check_failure(&state, "DeleteRecord")?;

        let mut found = false;
        for records in state.records.values_mut() {
            let before = records.len();
            records.retain(|r| r.record_id != Some(request.record_id));
            found |= records.len() != before;
        }

        if !found {
            return Err(EsaApiError::Api {
                action: "DeleteRecord".to_string(),
                status: 404,
                code: "Record.NotExist".to_string(),
                message: format!("record {} does not exist", request.record_id),
                request_id: None,
            });
        }

        Ok(DeleteRecordResponse { request_id: None })
    }
}

/// [`ClientFactory`] that hands out one shared [`InMemoryDnsApi`].
///
/// Credential and region validation match [`super::EsaClientFactory`], and
/// every successful build is remembered so callers can check which access
/// key and region were used.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClientFactory {
    api: InMemoryDnsApi,
    builds: Arc<Mutex<Vec<(String, String)>>>,
}

impl InMemoryClientFactory {
    #[must_use]
    pub fn new(api: InMemoryDnsApi) -> Self {
        Self {
            api,
            builds: Arc::default(),
        }
    }

    /// The backend every built handle points at.
    #[must_use]
    pub fn api(&self) -> &InMemoryDnsApi {
        &self.api
    }

    /// `(access_key_id, region)` of every successful build, in order.
    #[must_use]
    pub fn builds(&self) -> Vec<(String, String)> {
        self.builds
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl ClientFactory for InMemoryClientFactory {
    fn build(
        &self,
        access_key_id: &[u8],
        access_key_secret: &[u8],
        region: &str,
    ) -> Result<Arc<dyn DnsApi>, SolverError> {
        let credential = AccessKeyCredential::from_secret_bytes(access_key_id, access_key_secret)?;
        endpoint_for_region(region)?;

        self.builds
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((credential.access_key_id().to_string(), region.to_string()));

        Ok(Arc::new(self.api.clone()))
    }
}
