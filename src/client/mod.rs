//! Authenticated Request Client
//!
//! HTTP client for the tracker backend. Every authenticated call goes
//! through [`ApiClient::call`], which applies one policy:
//!
//! - the stored token is attached as `Authorization: Bearer <token>`
//! - a 401 clears the credential store and yields [`ClientError::Unauthorized`]
//! - any other non-2xx yields [`ClientError::RequestFailed`] with the
//!   backend's message when it sent one
//! - transport failures yield [`ClientError::Network`] and leave the session alone
//!
//! Nothing is retried.

mod error;

pub use error::{ClientError, ClientResult, ErrorKind};

use reqwest::{multipart::Form, Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::session::CredentialStore;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the request client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend API root (e.g., "http://localhost:5000/api")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            request_timeout_ms: 15_000,
        }
    }
}

/// Request payload
#[derive(Debug)]
pub enum Body {
    Json(Value),
    Multipart(Form),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Bearer,
    Anonymous,
}

/// Backend REST client bound to a credential store
pub struct ApiClient {
    http: Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiClient {
    /// Create a new client with the given configuration and session
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> ClientResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .user_agent(concat!("fintrack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    /// Get the current configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The session this client reads and clears
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Issue an authenticated request
    pub async fn call(&self, method: Method, path: &str, body: Option<Body>) -> ClientResult<Value> {
        self.execute(method, path, body, Auth::Bearer).await
    }

    /// Issue a request without a token. A 401 here means the submitted
    /// credentials were rejected, so it is reported as `RequestFailed`
    /// and the session is left as it was.
    pub async fn call_anonymous(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
    ) -> ClientResult<Value> {
        self.execute(method, path, body, Auth::Anonymous).await
    }

    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.call(Method::POST, path, Some(Body::Json(body))).await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.call(Method::PUT, path, Some(Body::Json(body))).await
    }

    pub async fn delete(&self, path: &str) -> ClientResult<Value> {
        self.call(Method::DELETE, path, None).await
    }

    /// Drop the stored token after the backend rejected it
    pub fn expire_session(&self) {
        if let Err(e) = self.credentials.clear() {
            tracing::warn!(error = %e, "Failed to clear rejected access token");
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        auth: Auth,
    ) -> ClientResult<Value> {
        let url = self.url(path);
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(REQUEST_ID_HEADER, &request_id);

        if auth == Auth::Bearer {
            if let Some(token) = self.credentials.get() {
                request = request.bearer_auth(token);
            }
        }

        request = match body {
            Some(Body::Json(value)) => request.json(&value),
            Some(Body::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%request_id, %method, path, error = %e, "Request did not complete");
            ClientError::from(e)
        })?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED && auth == Auth::Bearer {
            tracing::warn!(%request_id, %method, path, "Token rejected, clearing session");
            self.expire_session();
            return Err(ClientError::Unauthorized);
        }

        let bytes = response.bytes().await.map_err(|e| {
            tracing::warn!(%request_id, %method, path, error = %e, "Response body did not complete");
            ClientError::from(e)
        })?;

        if status.is_success() {
            tracing::debug!(%request_id, %method, path, status = status.as_u16(), "Request succeeded");
            decode_body(&bytes)
        } else {
            let message = error_message(status, &bytes);
            tracing::warn!(
                %request_id,
                %method,
                path,
                status = status.as_u16(),
                %message,
                "Request failed"
            );
            Err(ClientError::RequestFailed {
                status: Some(status.as_u16()),
                message,
            })
        }
    }
}

/// Decode a typed entity from a JSON payload
pub fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    serde_json::from_value(value).map_err(ClientError::unexpected_body)
}

fn decode_body(bytes: &[u8]) -> ClientResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(ClientError::unexpected_body)
}

/// Human-readable reason for a failed response
fn error_message(status: StatusCode, bytes: &[u8]) -> String {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(Value::as_str)
                .or_else(|| body.get("error").and_then(Value::as_str))
                .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
                .map(str::to_string)
        })
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
}
