// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `errors.rs`

#[cfg(test)]
mod tests {
    use crate::errors::{EsaApiError, SolverError};

    fn api_error() -> EsaApiError {
        EsaApiError::Api {
            action: "ListSites".to_string(),
            status: 403,
            code: "InvalidAccessKeyId.NotFound".to_string(),
            message: "Specified access key is not found.".to_string(),
            request_id: Some("5A2D-11".to_string()),
        }
    }

    #[test]
    fn test_secret_not_found_message_names_namespace_and_secret() {
        let err = SolverError::SecretNotFound {
            namespace: "cert-manager".to_string(),
            name: "alicloud-credentials".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to load secret \"cert-manager/alicloud-credentials\": secret not found"
        );
        assert_eq!(err.reason(), "SecretNotFound");
    }

    #[test]
    fn test_secret_key_not_found_message() {
        let err = SolverError::SecretKeyNotFound {
            namespace: "default".to_string(),
            name: "esa".to_string(),
            key: "access-key-id".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "no key \"access-key-id\" in secret \"default/esa\""
        );
        assert_eq!(err.reason(), "SecretKeyNotFound");
    }

    #[test]
    fn test_site_not_found_message() {
        let err = SolverError::SiteNotFound {
            zone: "example.com.".to_string(),
        };
        assert_eq!(err.to_string(), "site not found for domain: example.com.");
        assert_eq!(err.reason(), "SiteNotFound");
    }

    #[test]
    fn test_list_error_renders_cause_once() {
        let err = SolverError::List {
            resource: "sites",
            error: api_error(),
        };
        assert!(err.to_string().starts_with("failed to list sites: "));
        assert!(err.to_string().contains("InvalidAccessKeyId.NotFound"));
        assert_eq!(err.reason(), "ListError");

        let wrapped = anyhow::Error::new(err).context("failed to get site ID");
        assert_eq!(
            format!("{wrapped:#}").matches("InvalidAccessKeyId.NotFound").count(),
            1
        );
        assert_eq!(
            wrapped.downcast_ref::<SolverError>().map(SolverError::reason),
            Some("ListError")
        );
    }

    #[test]
    fn test_delete_error_names_record() {
        let err = SolverError::Delete {
            record_id: 42,
            error: EsaApiError::Transport {
                action: "DeleteRecord".to_string(),
                reason: "connection reset".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "failed to delete record 42: DeleteRecord request failed: connection reset"
        );
    }

    #[test]
    fn test_config_decode_reason() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = SolverError::ConfigDecode(json_err);
        assert!(err.to_string().starts_with("error decoding solver config: "));
        assert_eq!(err.reason(), "ConfigDecodeError");
    }

    #[test]
    fn test_api_error_code() {
        assert_eq!(api_error().code(), Some("InvalidAccessKeyId.NotFound"));

        let http = EsaApiError::Http {
            action: "ListRecords".to_string(),
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(http.code(), None);
        assert_eq!(http.to_string(), "ListRecords returned HTTP 502: bad gateway");
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            api_error().to_string(),
            "ListSites failed with InvalidAccessKeyId.NotFound: Specified access key is not found. (HTTP 403)"
        );
    }
}
