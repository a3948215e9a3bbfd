//! View Models
//!
//! Per-screen state: the last good payload of every named slice, a
//! loading flag, an optional error message and the sequence number of the
//! last applied fetch.
//!
//! Results are applied by issuance order. Every fetch is tagged with a
//! sequence number when it is issued; a result whose number is not greater
//! than the last applied one is stale and dropped, whatever order the
//! responses arrived in.

mod screens;

pub use screens::{AnalyticsView, DashboardView};

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;

use crate::client::ClientError;
use crate::fetch::{Aggregate, Endpoint};

/// Whether a result made it into the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    Stale,
}

/// State of one screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewModel {
    slices: HashMap<String, Value>,
    loading: bool,
    error: Option<String>,
    last_applied_seq: u64,
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// View model whose slices start at their endpoints' defaults
    pub fn with_defaults(endpoints: &[Endpoint]) -> Self {
        let slices = endpoints
            .iter()
            .map(|e| (e.name.clone(), e.shape.default_value()))
            .collect();
        Self {
            slices,
            ..Self::default()
        }
    }

    pub fn slice(&self, name: &str) -> Option<&Value> {
        self.slices.get(name)
    }

    pub fn slices(&self) -> &HashMap<String, Value> {
        &self.slices
    }

    /// Decode a slice into a typed value, falling back to the type's default
    pub fn decode<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.slices
            .get(name)
            .and_then(|value| match serde_json::from_value(value.clone()) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::debug!(slice = name, error = %e, "Slice did not decode, using default");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Decode a list slice item by item, skipping items that do not decode
    pub fn decode_list<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        match self.slices.get(name) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sequence number of the newest applied fetch (0 if none)
    pub fn last_applied_seq(&self) -> u64 {
        self.last_applied_seq
    }

    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    /// Stop showing the spinner without applying anything
    pub fn end_loading(&mut self) {
        self.loading = false;
    }

    /// Apply a settled aggregate issued as `seq`.
    ///
    /// Succeeded slices replace what the view holds. Failed slices keep
    /// their previous value, or the endpoint default if they never loaded.
    pub fn apply(&mut self, seq: u64, endpoints: &[Endpoint], aggregate: Aggregate) -> ApplyOutcome {
        if !self.accept(seq) {
            return ApplyOutcome::Stale;
        }

        let Aggregate {
            mut slices,
            failures,
        } = aggregate;

        for endpoint in endpoints {
            match slices.remove(&endpoint.name) {
                Some(value) => {
                    self.slices.insert(endpoint.name.clone(), value);
                }
                None => {
                    self.slices
                        .entry(endpoint.name.clone())
                        .or_insert_with(|| endpoint.shape.default_value());
                }
            }
        }

        self.error = if failures.is_empty() {
            None
        } else {
            let mut names: Vec<_> = failures.iter().collect();
            names.sort_by(|a, b| a.0.cmp(b.0));
            Some(
                names
                    .into_iter()
                    .map(|(name, err)| format!("Failed to load {}: {}", name, err))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };

        ApplyOutcome::Applied
    }

    /// Record a fetch issued as `seq` that failed as a whole; slices are kept
    pub fn fail(&mut self, seq: u64, error: &ClientError) -> ApplyOutcome {
        if !self.accept(seq) {
            return ApplyOutcome::Stale;
        }
        self.error = Some(error.to_string());
        ApplyOutcome::Applied
    }

    fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.last_applied_seq {
            tracing::debug!(seq, last_applied = self.last_applied_seq, "Dropping stale result");
            return false;
        }
        self.last_applied_seq = seq;
        self.loading = false;
        true
    }
}
