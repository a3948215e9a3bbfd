//! Screens
//!
//! Each screen performs its backend calls through the request client and
//! reports a typed outcome. Mutations are single-shot: no optimistic local
//! update and no retry; on success the caller navigates away or refreshes
//! through the aggregate fetcher.
//!
//! - [`auth`]: login, register, logout
//! - [`transactions`]: list, get, create, update, delete
//! - [`profile`]: get, update
//! - [`account`]: account deletion
//! - [`overview`]: one-shot dashboard and analytics loads

pub mod account;
pub mod auth;
pub mod overview;
pub mod profile;
pub mod transactions;

use reqwest::multipart::Part;
use serde::Serialize;
use std::path::Path;

use crate::client::{ClientError, ClientResult};

/// Where the user should be taken next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Expenses,
}

/// Route forced by an error, if any. Only a rejected session forces one.
pub fn redirect_for(error: &ClientError) -> Option<Route> {
    match error {
        ClientError::Unauthorized => Some(Route::Login),
        _ => None,
    }
}

/// A completed screen operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    Logout,
    CreateTransaction,
    UpdateTransaction,
    DeleteTransaction,
    UpdateProfile,
    DeleteAccount,
}

/// Where a successful `action` leads. `None` means stay on the current
/// screen, e.g. the add form stays open for the next entry.
pub fn route_after(action: Action) -> Option<Route> {
    match action {
        Action::Login => Some(Route::Dashboard),
        Action::Register | Action::Logout => Some(Route::Login),
        Action::UpdateTransaction | Action::DeleteTransaction => Some(Route::Expenses),
        Action::DeleteAccount => Some(Route::Register),
        Action::CreateTransaction | Action::UpdateProfile => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Success,
    Failure,
}

/// Inline message shown after a submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Failure,
            message: message.into(),
        }
    }

    /// Success text on `Ok`, the error's own message on `Err`
    pub fn from_result<T>(result: &ClientResult<T>, success: &str) -> Self {
        match result {
            Ok(_) => Notice::success(success),
            Err(e) => Notice::failure(e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == NoticeKind::Success
    }
}

/// Read a file into a multipart part named after the file
async fn file_part(path: &Path) -> ClientResult<Part> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        ClientError::validation(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Part::bytes(bytes).file_name(file_name))
}

/// Unwrap `{ "data": {...} }` envelopes around a single entity
fn unwrap_entity(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(mut map) if map.get("data").is_some_and(|d| d.is_object()) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    }
}
