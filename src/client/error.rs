//! Client error types
//!
//! Every failure a screen can see. The variant is the discriminator; user
//! facing code never inspects the message text to decide what happened.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the request client and the screens built on it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Token missing, expired or rejected. The session has been cleared.
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// Backend answered with a failure (or an unreadable success body)
    #[error("{message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// No response reached the client
    #[error("Network error: {0}")]
    Network(String),

    /// Rejected locally before any request was issued
    #[error("{0}")]
    Validation(String),

    /// Durable client state could not be updated
    #[error("Local storage error: {0}")]
    Storage(String),
}

/// Explicit kind tag for a [`ClientError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    RequestFailed,
    Network,
    Validation,
    Storage,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Unauthorized => ErrorKind::Unauthorized,
            ClientError::RequestFailed { .. } => ErrorKind::RequestFailed,
            ClientError::Network(_) => ErrorKind::Network,
            ClientError::Validation(_) => ErrorKind::Validation,
            ClientError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized)
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub(crate) fn unexpected_body(err: impl std::fmt::Display) -> Self {
        ClientError::RequestFailed {
            status: None,
            message: format!("Unexpected response from server: {}", err),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Network("Request timed out".to_string())
        } else if err.is_connect() {
            ClientError::Network(format!("Cannot reach server: {}", err))
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
