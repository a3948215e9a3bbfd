//! Common test utilities for fintrack integration tests.
//!
//! This module provides:
//! - Tracing initialization for test output
//! - An in-process fake tracker backend that records every request
//! - Client builders bound to an in-memory session

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use fintrack::{ApiClient, ClientConfig, MemoryCredentialStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Token the fake backend accepts
pub const VALID_TOKEN: &str = "valid-token";
/// Password the fake backend accepts on login
pub const PASSWORD: &str = "secret";

/// Initialize tracing once for integration tests.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::registry()
            .with(fmt::layer().with_test_writer())
            .with(filter)
            .init();
    });
}

/// One request as seen by the fake backend
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    /// Path below the API root, e.g. `/expenses/summary`
    pub path: String,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl Hit {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

#[derive(Default)]
struct Knobs {
    /// Forced status with a JSON `message` body
    failures: HashMap<String, u16>,
    /// Forced status with a non-JSON body
    plain: HashMap<String, u16>,
    delays: HashMap<String, Duration>,
}

#[derive(Clone, Default)]
struct Shared {
    hits: Arc<Mutex<Vec<Hit>>>,
    knobs: Arc<Mutex<Knobs>>,
}

/// Fake tracker backend listening on an ephemeral local port
pub struct FakeBackend {
    pub base_url: String,
    shared: Shared,
    server: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        init_tracing();

        let shared = Shared::default();
        let app = Router::new()
            .fallback(handle)
            .with_state(shared.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            shared,
            server,
        }
    }

    /// Answer `path` with `status` and a JSON message body
    pub fn fail_with(&self, path: &str, status: u16) {
        self.shared
            .knobs
            .lock()
            .unwrap()
            .failures
            .insert(path.to_string(), status);
    }

    /// Answer `path` with `status` and a plain text body
    pub fn plain_text(&self, path: &str, status: u16) {
        self.shared
            .knobs
            .lock()
            .unwrap()
            .plain
            .insert(path.to_string(), status);
    }

    pub fn delay(&self, path: &str, delay: Duration) {
        self.shared
            .knobs
            .lock()
            .unwrap()
            .delays
            .insert(path.to_string(), delay);
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.shared.hits.lock().unwrap().clone()
    }

    pub fn hits_to(&self, method: Method, path: &str) -> Vec<Hit> {
        self.hits()
            .into_iter()
            .filter(|h| h.method == method && h.path == path)
            .collect()
    }

    /// Client against this backend with the given session
    pub fn client(&self, session: Arc<MemoryCredentialStore>) -> ApiClient {
        client_for(&self.base_url, session)
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

pub fn client_for(base_url: &str, session: Arc<MemoryCredentialStore>) -> ApiClient {
    ApiClient::new(
        ClientConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 2_000,
        },
        session,
    )
    .unwrap()
}

/// API root on a port nothing listens on
pub fn unreachable_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

pub fn logged_in() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_token(VALID_TOKEN))
}

pub fn transactions() -> Vec<Value> {
    vec![
        json!({
            "_id": "tx1",
            "title": "Groceries",
            "amount": 800,
            "category": "Food",
            "date": "2024-03-02T00:00:00.000Z",
            "type": "expense"
        }),
        json!({
            "_id": "tx2",
            "title": "March salary",
            "amount": "5000",
            "category": "Salary",
            "date": "2024-03-01T00:00:00.000Z"
        }),
    ]
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn handle(
    State(shared): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri
        .path()
        .strip_prefix("/api")
        .unwrap_or(uri.path())
        .to_string();
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    shared.hits.lock().unwrap().push(Hit {
        method: method.clone(),
        path: path.clone(),
        authorization: header("authorization"),
        request_id: header("x-request-id"),
        content_type: header("content-type"),
        body: body.clone(),
    });

    let (failure, plain, delay) = {
        let knobs = shared.knobs.lock().unwrap();
        (
            knobs.failures.get(&path).copied(),
            knobs.plain.get(&path).copied(),
            knobs.delays.get(&path).copied(),
        )
    };

    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(status) = failure {
        let status = StatusCode::from_u16(status).unwrap();
        return message(status, &format!("Forced failure on {}", path));
    }
    if let Some(status) = plain {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "<html>upstream unavailable</html>").into_response();
    }

    match (method.as_str(), path.as_str()) {
        ("POST", "/auth/login") => {
            let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            if body["password"] == PASSWORD {
                return Json(json!({ "accessToken": VALID_TOKEN })).into_response();
            }
            return message(StatusCode::UNAUTHORIZED, "Invalid credentials");
        }
        ("POST", "/auth/register") => {
            return message(StatusCode::CREATED, "User registered successfully");
        }
        _ => {}
    }

    let expected = format!("Bearer {}", VALID_TOKEN);
    if header("authorization").as_deref() != Some(expected.as_str()) {
        return message(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }

    match (method.as_str(), path.as_str()) {
        ("POST", "/auth/logout") => message(StatusCode::OK, "Logged out"),
        ("GET", "/auth/profile") => Json(json!({
            "username": "asha",
            "email": "asha@example.com"
        }))
        .into_response(),
        ("PUT", "/auth/profile") => message(StatusCode::OK, "Profile updated"),
        ("DELETE", "/auth/delete-account") => message(StatusCode::OK, "Account deleted"),
        ("GET", "/expenses") => Json(json!({ "data": transactions() })).into_response(),
        ("GET", "/expenses/summary") => {
            Json(json!({ "income": 5000, "totalExpense": 1200 })).into_response()
        }
        ("GET", "/expenses/recent") => Json(json!([transactions()[0].clone()])).into_response(),
        ("GET", "/expenses/categories") => Json(json!({
            "data": [
                { "_id": "Food", "total": 800 },
                { "_id": "Transport", "total": 400 }
            ]
        }))
        .into_response(),
        ("POST", "/expenses") | ("POST", "/income") => {
            let mut created: Value = serde_json::from_slice(&body).unwrap_or_else(|_| json!({}));
            created["_id"] = json!("new1");
            (StatusCode::CREATED, Json(json!({ "data": created }))).into_response()
        }
        (verb, p) if p.starts_with("/expenses/") => {
            let id = &p["/expenses/".len()..];
            let known = transactions().into_iter().find(|tx| tx["_id"] == id);
            match (verb, known) {
                (_, None) => message(StatusCode::NOT_FOUND, "Transaction not found"),
                ("GET", Some(tx)) => Json(tx).into_response(),
                ("PUT", Some(_)) => message(StatusCode::OK, "Transaction updated"),
                ("DELETE", Some(_)) => message(StatusCode::OK, "Transaction deleted"),
                _ => message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
            }
        }
        _ => message(StatusCode::NOT_FOUND, "Not found"),
    }
}
