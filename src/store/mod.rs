//! Durable client state
//!
//! A small key/value file that survives restarts, used for the bearer
//! token and the display preferences. Nothing in here is ever sent to
//! the backend.

mod error;
mod local;

pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
