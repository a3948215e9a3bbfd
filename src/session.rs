//! Credential Store
//!
//! Holds the bearer token for the current session. The store is passed
//! explicitly to the request client as `Arc<dyn CredentialStore>` so the
//! clear-on-401 effect can be observed in tests.
//!
//! There is no local expiry tracking: an expired token is only discovered
//! when the backend rejects it.

use std::sync::{Arc, RwLock};

use crate::store::{LocalStore, StoreError, StoreResult};

/// Key the token is stored under in the local store
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage for the session's bearer token
pub trait CredentialStore: Send + Sync {
    /// Current token, if any
    fn get(&self) -> Option<String>;

    /// Replace the token
    fn set(&self, token: &str) -> StoreResult<()>;

    /// Forget the token. Clearing an empty store succeeds.
    fn clear(&self) -> StoreResult<()>;

    /// Whether a token is present
    fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

/// Token kept in the durable local store, surviving restarts
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    store: Arc<LocalStore>,
}

impl FileCredentialStore {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self { store }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        match self.store.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read access token");
                None
            }
        }
    }

    fn set(&self, token: &str) -> StoreResult<()> {
        self.store.set(ACCESS_TOKEN_KEY, token)
    }

    fn clear(&self) -> StoreResult<()> {
        self.store.remove(ACCESS_TOKEN_KEY)
    }
}

/// Token held in memory only
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn set(&self, token: &str) -> StoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        *slot = None;
        Ok(())
    }
}
