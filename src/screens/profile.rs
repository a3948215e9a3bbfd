//! Profile view and update

use reqwest::multipart::Form;
use reqwest::Method;
use std::path::PathBuf;

use crate::client::{decode, ApiClient, Body, ClientError, ClientResult};
use crate::models::Profile;

use super::{file_part, unwrap_entity};

pub async fn get(client: &ApiClient) -> ClientResult<Profile> {
    let value = client.get("/auth/profile").await?;
    decode(unwrap_entity(value))
}

/// Changes submitted from the profile screen
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    /// New password; left unchanged when `None`
    pub password: Option<String>,
    /// New profile photo
    pub photo: Option<PathBuf>,
}

/// Send a profile update as multipart form data
pub async fn update(client: &ApiClient, changes: &ProfileUpdate) -> ClientResult<()> {
    let username = changes.username.trim();
    if username.is_empty() {
        return Err(ClientError::validation("Username is required"));
    }

    let mut form = Form::new().text("username", username.to_string());
    if let Some(password) = changes.password.as_deref().filter(|p| !p.is_empty()) {
        form = form.text("password", password.to_string());
    }
    if let Some(photo) = &changes.photo {
        form = form.part("profilePic", file_part(photo).await?);
    }

    client
        .call(Method::PUT, "/auth/profile", Some(Body::Multipart(form)))
        .await?;

    tracing::info!(username, "Profile updated");
    Ok(())
}
