// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `records.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{EsaApiError, SolverError};
    use crate::esa::memory::{ApiCall, InMemoryDnsApi};
    use crate::records::{create_txt_record, delete_txt_record};

    const SITE: i64 = 42;
    const NAME: &str = "_acme-challenge.example.com";

    fn transport_error(action: &str) -> EsaApiError {
        EsaApiError::Transport {
            action: action.to_string(),
            reason: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_issues_txt_with_fixed_ttl() {
        let api = InMemoryDnsApi::new();

        create_txt_record(&api, SITE, NAME, "abc123").await.unwrap();

        assert_eq!(
            api.calls(),
            vec![ApiCall::CreateRecord {
                site_id: SITE,
                record_name: NAME.to_string(),
                value: "abc123".to_string(),
                ttl: 300,
            }]
        );
        let stored = api.records(SITE);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record_type.as_deref(), Some("TXT"));
    }

    #[tokio::test]
    async fn test_create_twice_is_tolerated() {
        let api = InMemoryDnsApi::new();

        create_txt_record(&api, SITE, NAME, "abc123").await.unwrap();
        create_txt_record(&api, SITE, NAME, "abc123").await.unwrap();

        assert_eq!(api.txt_values(SITE, NAME), vec!["abc123", "abc123"]);
    }

    #[tokio::test]
    async fn test_create_failure_is_create_error() {
        let api = InMemoryDnsApi::new();
        api.fail_action("CreateRecord", transport_error("CreateRecord"));

        let err = create_txt_record(&api, SITE, NAME, "abc123").await.unwrap_err();
        assert!(matches!(err, SolverError::Create(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_value() {
        let api = InMemoryDnsApi::new();
        api.seed_record(SITE, "TXT", NAME, "key1");
        api.seed_record(SITE, "TXT", NAME, "key2");

        delete_txt_record(&api, SITE, NAME, "key2").await.unwrap();

        assert_eq!(api.txt_values(SITE, NAME), vec!["key1"]);
        assert_eq!(api.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_stops_after_first_match() {
        let api = InMemoryDnsApi::new();
        let first = api.seed_record(SITE, "TXT", NAME, "dup");
        api.seed_record(SITE, "TXT", NAME, "dup");

        delete_txt_record(&api, SITE, NAME, "dup").await.unwrap();

        assert_eq!(api.txt_values(SITE, NAME), vec!["dup"]);
        assert!(api
            .calls()
            .contains(&ApiCall::DeleteRecord { record_id: first }));
        assert_eq!(api.delete_calls(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_match_succeeds() {
        let api = InMemoryDnsApi::new();
        api.seed_record(SITE, "TXT", NAME, "other-value");
        api.seed_record(SITE, "TXT", "_acme-challenge.other.com", "abc123");

        delete_txt_record(&api, SITE, NAME, "abc123").await.unwrap();

        assert_eq!(api.delete_calls(), 0);
        assert_eq!(api.records(SITE).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_on_empty_site_succeeds() {
        let api = InMemoryDnsApi::new();
        delete_txt_record(&api, SITE, NAME, "abc123").await.unwrap();
        assert_eq!(api.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_ignores_non_txt_records() {
        let api = InMemoryDnsApi::new();
        api.seed_record(SITE, "CNAME", NAME, "abc123");

        delete_txt_record(&api, SITE, NAME, "abc123").await.unwrap();
        assert_eq!(api.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_delete_finds_match_on_later_page() {
        let api = InMemoryDnsApi::new();
        for i in 0..150 {
            api.seed_record(SITE, "TXT", NAME, &format!("stale-{i}"));
        }
        api.seed_record(SITE, "TXT", NAME, "target");

        delete_txt_record(&api, SITE, NAME, "target").await.unwrap();

        let pages: Vec<u32> = api
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                ApiCall::ListRecords { page_number, .. } => Some(page_number),
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![1, 2]);
        assert!(!api.txt_values(SITE, NAME).contains(&"target".to_string()));
    }

    #[tokio::test]
    async fn test_list_failure_is_list_error() {
        let api = InMemoryDnsApi::new();
        api.fail_action("ListRecords", transport_error("ListRecords"));

        let err = delete_txt_record(&api, SITE, NAME, "abc123").await.unwrap_err();
        match err {
            SolverError::List { resource, .. } => assert_eq!(resource, "records"),
            other => panic!("expected List error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_failure_is_delete_error() {
        let api = InMemoryDnsApi::new();
        let record_id = api.seed_record(SITE, "TXT", NAME, "abc123");
        api.fail_action("DeleteRecord", transport_error("DeleteRecord"));

        let err = delete_txt_record(&api, SITE, NAME, "abc123").await.unwrap_err();
        match err {
            SolverError::Delete { record_id: id, .. } => assert_eq!(id, record_id),
            other => panic!("expected Delete error, got {other:?}"),
        }
    }
}
