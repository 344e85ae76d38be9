// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `config.rs`

#[cfg(test)]
mod tests {
    use crate::config::{load_config, ProviderConfig, SecretKeySelector};
    use crate::errors::SolverError;
    use serde_json::json;

    #[test]
    fn test_absent_config_is_zero_valued() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, ProviderConfig::default());
        assert!(cfg.region_id.is_empty());
    }

    #[test]
    fn test_null_config_is_zero_valued() {
        let cfg = load_config(Some(&serde_json::Value::Null)).unwrap();
        assert_eq!(cfg, ProviderConfig::default());
    }

    #[test]
    fn test_empty_object_is_zero_valued() {
        assert_eq!(load_config(Some(&json!({}))).unwrap(), ProviderConfig::default());
    }

    #[test]
    fn test_full_config_decodes() {
        let cfg = load_config(Some(&json!({
            "accessKeyIdSecretRef": {"name": "alicloud", "key": "access-key-id"},
            "accessKeySecretSecretRef": {"name": "alicloud", "key": "access-key-secret"},
            "regionId": "ap-southeast-1"
        })))
        .unwrap();

        assert_eq!(
            cfg.access_key_id,
            SecretKeySelector {
                name: "alicloud".to_string(),
                key: "access-key-id".to_string(),
            }
        );
        assert_eq!(cfg.access_key_secret.key, "access-key-secret");
        assert_eq!(cfg.region_id, "ap-southeast-1");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let cfg = load_config(Some(&json!({
            "regionId": "cn-hangzhou",
            "endpointOverride": "esa.example.internal"
        })))
        .unwrap();
        assert_eq!(cfg.region_id, "cn-hangzhou");
    }

    #[test]
    fn test_wrong_field_type_fails() {
        let err = load_config(Some(&json!({"regionId": 42}))).unwrap_err();
        assert!(matches!(err, SolverError::ConfigDecode(_)));

        let err = load_config(Some(&json!("not-an-object"))).unwrap_err();
        assert!(matches!(err, SolverError::ConfigDecode(_)));
    }

    #[test]
    fn test_config_serializes_with_wire_names() {
        let value = serde_json::to_value(ProviderConfig {
            region_id: "cn-shanghai".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["regionId"], "cn-shanghai");
        assert!(value.get("accessKeyIdSecretRef").is_some());
        assert!(value.get("accessKeySecretSecretRef").is_some());
    }
}
