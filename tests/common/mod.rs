// Common test utilities for integration tests

#![allow(dead_code)]

use esa_webhook::solver::Solver;
use esa_webhook::webhook::{build_router, serve, SolverRegistry, WebhookState};
use kube::client::Client;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// API group the test webhook serves
pub const GROUP: &str = "acme.example.com";

/// Namespace challenges are issued from
pub const NAMESPACE: &str = "cert-manager";

/// Secret holding the AccessKey pair
pub const SECRET_NAME: &str = "alicloud-credentials";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {}", e);
            None
        }
    }
}

/// Webhook running on a loopback port
pub struct TestWebhook {
    pub addr: SocketAddr,
    pub http: reqwest::Client,
    stop: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestWebhook {
    /// Start a webhook serving `solver` under [`GROUP`]
    pub async fn start(solver: Arc<dyn Solver>) -> Self {
        let mut registry = SolverRegistry::new();
        registry.register(solver).expect("register solver");

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        let (stop, stop_rx) = watch::channel(false);
        let router = build_router(Arc::new(WebhookState::new(GROUP, registry)));
        let handle = tokio::spawn(serve(listener, router, stop_rx));

        Self {
            addr,
            http: reqwest::Client::new(),
            stop,
            handle,
        }
    }

    /// POST a challenge payload to `solver` and return the decoded `response`
    pub async fn challenge(&self, solver: &str, payload: &Value) -> Value {
        let url = format!("http://{}/apis/{GROUP}/v1alpha1/{solver}", self.addr);
        let response = self
            .http
            .post(url)
            .json(payload)
            .send()
            .await
            .expect("webhook reachable");
        assert_eq!(response.status(), 200, "challenge answered with an envelope");

        let body: Value = response.json().await.expect("JSON envelope");
        body["response"].clone()
    }

    /// Stop the server and wait for it to exit
    pub async fn shutdown(self) {
        self.stop.send(true).expect("server still running");
        self.handle
            .await
            .expect("server task joined")
            .expect("server exited cleanly");
    }
}

/// Solver configuration pointing at [`SECRET_NAME`]
pub fn solver_config(region: &str) -> Value {
    json!({
        "accessKeyIdSecretRef": {"name": SECRET_NAME, "key": "access-key-id"},
        "accessKeySecretSecretRef": {"name": SECRET_NAME, "key": "access-key-secret"},
        "regionId": region
    })
}

/// A `ChallengePayload` for `_acme-challenge.example.com.`
pub fn challenge_payload(uid: &str, action: &str, key: &str, config: &Value) -> Value {
    json!({
        "apiVersion": "webhook.acme.cert-manager.io/v1alpha1",
        "kind": "ChallengePayload",
        "request": {
            "uid": uid,
            "action": action,
            "type": "dns-01",
            "dnsName": "example.com",
            "key": key,
            "resourceNamespace": NAMESPACE,
            "resolvedFQDN": "_acme-challenge.example.com.",
            "resolvedZone": "example.com.",
            "allowAmbientCredentials": false,
            "config": config
        }
    })
}
