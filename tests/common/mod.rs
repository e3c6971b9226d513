//! Shared helpers for integration tests
//!
//! In-process axum servers standing in for the webhook endpoint and the Vault API.

#![allow(dead_code)]

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;
use vault_warden::config::WardenConfig;

// ===== Fake webhook =====

#[derive(Clone)]
struct WebhookState {
    received: Arc<Mutex<Vec<Value>>>,
    status: StatusCode,
}

pub struct FakeWebhook {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl FakeWebhook {
    /// Embeds received so far (one per notification)
    pub fn embeds(&self) -> Vec<Value> {
        self.received
            .lock()
            .unwrap()
            .iter()
            .map(|payload| payload["embeds"][0].clone())
            .collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.embeds()
            .iter()
            .map(|embed| embed["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    /// Wait until at least `n` notifications arrived
    pub async fn wait_for(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while self.count() < n {
            if tokio::time::Instant::now() > deadline {
                panic!(
                    "Timed out waiting for {} notifications, got {:?}",
                    n,
                    self.titles()
                );
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

async fn record_webhook(State(state): State<WebhookState>, Json(body): Json<Value>) -> StatusCode {
    state.received.lock().unwrap().push(body);
    state.status
}

/// Start a webhook endpoint that records payloads and answers with `status`
pub async fn spawn_webhook(status: StatusCode) -> FakeWebhook {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = WebhookState {
        received: received.clone(),
        status,
    };
    let app = Router::new()
        .route("/webhook", post(record_webhook))
        .with_state(state);

    let addr = serve(app).await;
    FakeWebhook {
        url: format!("http://{}/webhook", addr),
        received,
    }
}

// ===== Fake Vault =====

#[derive(Clone)]
struct VaultState {
    sealed: Arc<Mutex<bool>>,
    /// Sealed flag returned by each successive unseal call
    script: Arc<Mutex<VecDeque<bool>>>,
    keys: Arc<Mutex<Vec<String>>>,
}

pub struct FakeVault {
    pub address: String,
    keys: Arc<Mutex<Vec<String>>>,
}

impl FakeVault {
    pub fn submitted_keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

fn status_body(sealed: bool, progress: usize) -> Value {
    json!({
        "initialized": true,
        "sealed": sealed,
        "standby": false,
        "progress": progress,
        "t": 3,
        "n": 5,
        "version": "1.15.0"
    })
}

async fn health(State(state): State<VaultState>) -> (StatusCode, Json<Value>) {
    let sealed = *state.sealed.lock().unwrap();
    let progress = state.keys.lock().unwrap().len();
    // Vault reports a sealed node with 503
    let status = if sealed {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (status, Json(status_body(sealed, progress)))
}

async fn unseal(State(state): State<VaultState>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let key = body["key"].as_str().unwrap_or_default().to_string();
    let progress = {
        let mut keys = state.keys.lock().unwrap();
        keys.push(key);
        keys.len()
    };
    let sealed = state.script.lock().unwrap().pop_front().unwrap_or(true);
    *state.sealed.lock().unwrap() = sealed;
    (StatusCode::OK, Json(status_body(sealed, if sealed { progress } else { 0 })))
}

/// Start a Vault stand-in. `unseal_script` gives the sealed flag returned by each
/// successive unseal call (calls beyond the script stay sealed).
pub async fn spawn_vault(initially_sealed: bool, unseal_script: Vec<bool>) -> FakeVault {
    let keys = Arc::new(Mutex::new(Vec::new()));
    let state = VaultState {
        sealed: Arc::new(Mutex::new(initially_sealed)),
        script: Arc::new(Mutex::new(unseal_script.into())),
        keys: keys.clone(),
    };
    let app = Router::new()
        .route("/v1/sys/health", get(health))
        .route("/v1/sys/unseal", put(unseal))
        .with_state(state);

    let addr = serve(app).await;
    FakeVault {
        address: format!("http://{}", addr),
        keys,
    }
}

async fn serve(app: Router) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

// ===== Files and config =====

pub fn create_test_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{}_{}", prefix, Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("Failed to create test dir");
    dir
}

pub fn append(path: &Path, content: &str) {
    use std::io::Write;
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .expect("Failed to open log for append");
    file.write_all(content.as_bytes()).expect("Failed to append");
}

pub fn test_config(address: &str, webhook_url: &str, audit_log: &Path) -> WardenConfig {
    let yaml = format!(
        r#"
address: "{}"
unseal_keys: ["key-1", "key-2", "key-3"]
webhook_url: "{}"
audit_log: "{}"
poll_interval_ms: 20
http_timeout_secs: 5
"#,
        address,
        webhook_url,
        audit_log.display()
    );
    WardenConfig::from_yaml(&yaml).expect("valid test config")
}
