//! Login, registration and logout

use reqwest::multipart::Form;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::PathBuf;

use crate::client::{decode, ApiClient, Body, ClientError, ClientResult};

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Authenticate and store the returned token.
///
/// Rejected credentials come back as `RequestFailed`; an existing session
/// is left untouched in that case.
pub async fn login(client: &ApiClient, email: &str, password: &str) -> ClientResult<()> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ClientError::validation("Email and password are required"));
    }

    let response = client
        .call_anonymous(
            Method::POST,
            "/auth/login",
            Some(Body::Json(json!({ "email": email, "password": password }))),
        )
        .await?;

    let LoginResponse { access_token } = decode(response)?;
    if access_token.is_empty() {
        return Err(ClientError::unexpected_body("empty access token"));
    }

    client.credentials().set(&access_token)?;
    tracing::info!("Logged in");
    Ok(())
}

/// New account details
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub photo: Option<PathBuf>,
}

impl Registration {
    pub fn validate(&self) -> ClientResult<()> {
        if self.username.trim().is_empty() {
            return Err(ClientError::validation("Username is required"));
        }
        if !self.email.contains('@') {
            return Err(ClientError::validation("A valid email is required"));
        }
        if self.password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }
        Ok(())
    }
}

/// Create an account. Does not log in.
pub async fn register(client: &ApiClient, registration: &Registration) -> ClientResult<Value> {
    registration.validate()?;

    let mut form = Form::new()
        .text("username", registration.username.trim().to_string())
        .text("email", registration.email.trim().to_string())
        .text("password", registration.password.clone());

    if let Some(photo) = &registration.photo {
        form = form.part("profilePic", super::file_part(photo).await?);
    }

    let response = client
        .call_anonymous(Method::POST, "/auth/register", Some(Body::Multipart(form)))
        .await?;

    tracing::info!(username = %registration.username.trim(), "Registered account");
    Ok(response)
}

/// End the session.
///
/// The local token is dropped whenever the backend answered, even with an
/// error status, since the session is unusable either way. On a network
/// failure it is kept so the user can try again.
pub async fn logout(client: &ApiClient) -> ClientResult<()> {
    match client.call(Method::POST, "/auth/logout", None).await {
        Ok(_) => {}
        Err(ClientError::Unauthorized) => {}
        Err(ClientError::RequestFailed { status, message }) => {
            tracing::warn!(?status, %message, "Backend logout failed, clearing local session anyway");
        }
        Err(e) => return Err(e),
    }

    client.credentials().clear()?;
    tracing::info!("Logged out");
    Ok(())
}
