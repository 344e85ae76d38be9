// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Full-stack tests: webhook, solver and signed ESA client against a stub ESA API.
//!
//! Run with: cargo test --test esa_wire_integration

mod common;

use common::{challenge_payload, solver_config, TestWebhook, NAMESPACE, SECRET_NAME};
use esa_webhook::constants::SOLVER_NAME;
use esa_webhook::esa::EsaClientFactory;
use esa_webhook::secrets::InMemorySecretStore;
use esa_webhook::solver::EsaSolver;
use serde_json::json;
use std::sync::Arc;
use url::Url;
use wiremock::matchers::{header, header_regex, method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn webhook_for(esa: &MockServer) -> TestWebhook {
    let store = InMemorySecretStore::new();
    store.insert(NAMESPACE, SECRET_NAME, "access-key-id", "LTAI5tWireTest\n");
    store.insert(NAMESPACE, SECRET_NAME, "access-key-secret", "wire-secret\n");

    let factory =
        EsaClientFactory::with_base_url(Url::parse(&format!("{}/", esa.uri())).unwrap());
    let solver = EsaSolver::with_client_factory(Arc::new(factory))
        .with_secret_store(Arc::new(store));
    TestWebhook::start(Arc::new(solver)).await
}

async fn mount_sites(esa: &MockServer) {
    Mock::given(method("POST"))
        .and(header("x-acs-action", "ListSites"))
        .and(query_param("PageNumber", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "RequestId": "sites-1",
            "PageNumber": 1,
            "PageSize": 100,
            "TotalCount": 2,
            "Sites": [
                {"SiteId": 100, "SiteName": "example.org"},
                {"SiteId": 200, "SiteName": "example.com"}
            ]
        })))
        .mount(esa)
        .await;
}

#[tokio::test]
async fn test_present_signs_and_creates_record() {
    let esa = MockServer::start().await;
    mount_sites(&esa).await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "CreateRecord"))
        .and(header_regex(
            "authorization",
            r"^ACS3-HMAC-SHA256 Credential=LTAI5tWireTest,SignedHeaders=host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,Signature=[0-9a-f]{64}$",
        ))
        .and(query_param("SiteId", "200"))
        .and(query_param("RecordName", "_acme-challenge.example.com"))
        .and(query_param("Type", "TXT"))
        .and(query_param("Ttl", "300"))
        .and(query_param("Data", r#"{"Value":"abc123"}"#))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"RequestId": "c-1", "RecordId": 9})),
        )
        .expect(1)
        .mount(&esa)
        .await;

    let webhook = webhook_for(&esa).await;
    let response = webhook
        .challenge(
            SOLVER_NAME,
            &challenge_payload("uid-1", "Present", "abc123", &solver_config("cn-hangzhou")),
        )
        .await;
    assert_eq!(response["success"], true, "response: {response}");

    webhook.shutdown().await;
    esa.verify().await;
}

#[tokio::test]
async fn test_cleanup_deletes_record_with_matching_value() {
    let esa = MockServer::start().await;
    mount_sites(&esa).await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "ListRecords"))
        .and(query_param("SiteId", "200"))
        .and(query_param("RecordName", "_acme-challenge.example.com"))
        .and(query_param("RecordMatchType", "exact"))
        .and(query_param("Type", "TXT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "PageNumber": 1,
            "PageSize": 100,
            "TotalCount": 2,
            "Records": [
                {"RecordId": 11, "RecordName": "_acme-challenge.example.com", "RecordType": "TXT", "Data": {"Value": "key1"}},
                {"RecordId": 12, "RecordName": "_acme-challenge.example.com", "RecordType": "TXT", "Data": {"Value": "key2"}}
            ]
        })))
        .mount(&esa)
        .await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "DeleteRecord"))
        .and(query_param("RecordId", "12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"RequestId": "d-1"})))
        .expect(1)
        .mount(&esa)
        .await;

    let webhook = webhook_for(&esa).await;
    let response = webhook
        .challenge(
            SOLVER_NAME,
            &challenge_payload("uid-2", "CleanUp", "key2", &solver_config("cn-hangzhou")),
        )
        .await;
    assert_eq!(response["success"], true, "response: {response}");

    webhook.shutdown().await;
    esa.verify().await;
}

#[tokio::test]
async fn test_esa_error_code_surfaces_in_status_message() {
    let esa = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-acs-action", "ListSites"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "RequestId": "err-1",
            "Code": "InvalidAccessKeyId.NotFound",
            "Message": "Specified access key is not found."
        })))
        .mount(&esa)
        .await;

    let webhook = webhook_for(&esa).await;
    let response = webhook
        .challenge(
            SOLVER_NAME,
            &challenge_payload("uid-3", "Present", "abc123", &solver_config("cn-hangzhou")),
        )
        .await;

    assert_eq!(response["success"], false);
    assert_eq!(response["status"]["reason"], "ListError");
    let message = response["status"]["message"].as_str().unwrap();
    assert!(message.starts_with("failed to get site ID: failed to list sites: "), "{message}");
    assert!(message.contains("InvalidAccessKeyId.NotFound"), "{message}");

    webhook.shutdown().await;
}
