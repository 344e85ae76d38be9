// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `challenge.rs`

#[cfg(test)]
mod tests {
    use crate::challenge::{
        un_fqdn, ChallengeAction, ChallengePayload, ChallengeRequest, ChallengeResponse,
    };
    use serde_json::json;

    #[test]
    fn test_un_fqdn_strips_single_trailing_dot() {
        assert_eq!(un_fqdn("example.com."), "example.com");
        assert_eq!(un_fqdn("example.com"), "example.com");
        assert_eq!(un_fqdn(""), "");
        assert_eq!(un_fqdn("."), "");
    }

    #[test]
    fn test_record_name_uses_full_fqdn() {
        let request = ChallengeRequest {
            resolved_fqdn: "_acme-challenge.www.example.com.".to_string(),
            resolved_zone: "example.com.".to_string(),
            ..Default::default()
        };
        assert_eq!(request.record_name(), "_acme-challenge.www.example.com");
    }

    #[test]
    fn test_deserialize_cert_manager_payload() {
        let payload: ChallengePayload = serde_json::from_value(json!({
            "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
            "kind": "ChallengePayload",
            "request": {
                "uid": "6b5d0a3e",
                "action": "Present",
                "type": "dns-01",
                "dnsName": "example.com",
                "key": "abc123",
                "resourceNamespace": "cert-manager",
                "resolvedFQDN": "_acme-challenge.example.com.",
                "resolvedZone": "example.com.",
                "allowAmbientCredentials": false,
                "config": {"regionId": "cn-hangzhou"}
            }
        }))
        .unwrap();

        let request = payload.request.unwrap();
        assert_eq!(request.uid, "6b5d0a3e");
        assert_eq!(request.action, ChallengeAction::Present);
        assert_eq!(request.challenge_type, "dns-01");
        assert_eq!(request.key, "abc123");
        assert_eq!(request.resource_namespace, "cert-manager");
        assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
        assert_eq!(request.resolved_zone, "example.com.");
        assert_eq!(request.config, Some(json!({"regionId": "cn-hangzhou"})));
    }

    #[test]
    fn test_deserialize_cleanup_without_config() {
        let request: ChallengeRequest = serde_json::from_value(json!({
            "uid": "1",
            "action": "CleanUp",
            "key": "k"
        }))
        .unwrap();
        assert_eq!(request.action, ChallengeAction::CleanUp);
        assert!(request.config.is_none());
        assert_eq!(request.action.as_str(), "cleanup");
    }

    #[test]
    fn test_success_response_serialization() {
        let payload = ChallengePayload::with_response(ChallengeResponse::success("uid-1"));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value["apiVersion"], "webhook.acme.cert-manager.io/v1alpha1");
        assert_eq!(value["kind"], "ChallengePayload");
        assert_eq!(value["response"]["uid"], "uid-1");
        assert_eq!(value["response"]["success"], true);
        assert!(value["response"].get("status").is_none());
        assert!(value.get("request").is_none());
    }

    #[test]
    fn test_failure_response_carries_status() {
        let response =
            ChallengeResponse::failure("uid-2", "SiteNotFound", "failed to get site ID".into());
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["status"]["status"], "Failure");
        assert_eq!(value["status"]["reason"], "SiteNotFound");
        assert_eq!(value["status"]["message"], "failed to get site ID");
    }
}
