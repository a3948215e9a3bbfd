//! # fintrack
//!
//! Session-aware data layer for a personal expense and income tracker.
//! Talks to the tracker's REST backend with a bearer token and keeps
//! screens fresh by polling.
//!
//! ## Features
//!
//! - **Single session policy**: every authenticated call attaches the stored
//!   token, and any 401 clears it and reports `Unauthorized`
//! - **Best-effort screens**: a screen's sub-requests run concurrently and a
//!   failing slice keeps its last good value
//! - **Ordered polling**: overlapping refreshes are resolved by sequence
//!   number, and nothing is written after a screen unmounts
//! - **Guarded mutations**: local validation runs before any request, and
//!   account deletion requires typing `DELETE`
//!
//! ## Modules
//!
//! - [`store`]: durable key/value file for client state
//! - [`session`]: credential stores
//! - [`client`]: authenticated request client
//! - [`fetch`]: aggregate fetcher and shape normalization
//! - [`view`]: view models and screen projections
//! - [`poll`]: polling controller
//! - [`screens`]: auth, transactions, profile, account, overview
//! - [`prefs`]: theme and currency preferences
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fintrack::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(LocalStore::open("state.json")?);
//!     let session = Arc::new(FileCredentialStore::new(store));
//!     let client = Arc::new(ApiClient::new(ClientConfig::default(), session)?);
//!
//!     screens::auth::login(&client, "asha@example.com", "secret").await?;
//!
//!     let fetcher = AggregateFetcher::new(client);
//!     let dashboard = screens::overview::load_dashboard(&fetcher).await?;
//!     println!("Welcome, {}", dashboard.greeting_name());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod fetch;
pub mod models;
pub mod poll;
pub mod prefs;
pub mod screens;
pub mod session;
pub mod store;
pub mod view;

// Re-export top-level types for convenience
pub use client::{ApiClient, Body, ClientConfig, ClientError, ClientResult, ErrorKind};

pub use config::{generate_default_config, Config, ConfigError, LoggingConfig};

pub use fetch::{Aggregate, AggregateFetcher, AggregateSource, Endpoint, Shape};

pub use models::{
    CategoryTotal, Profile, Summary, Transaction, TransactionInput, TransactionKind,
    EXPENSE_CATEGORIES, INCOME_CATEGORIES,
};

pub use poll::{PollConfig, PollEvent, PollHandle, SharedView};

pub use prefs::{Currency, Preferences, Theme};

pub use screens::{Notice, NoticeKind, Route};

pub use session::{CredentialStore, FileCredentialStore, MemoryCredentialStore};

pub use store::{LocalStore, StoreError, StoreResult};

pub use view::{AnalyticsView, ApplyOutcome, DashboardView, ViewModel};
