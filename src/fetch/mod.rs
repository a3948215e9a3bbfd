//! Aggregate Fetcher
//!
//! One logical view refresh made of several concurrent sub-requests.
//!
//! Policy, the same for every screen:
//! - if any sub-request comes back `Unauthorized`, the whole aggregate is
//!   `Unauthorized`, whatever the others returned
//! - otherwise every successful slice is returned normalized and every
//!   failed slice is reported in [`Aggregate::failures`]; the view model
//!   decides what to keep (see [`crate::view::ViewModel::apply`])

use async_trait::async_trait;
use futures_util::future::join_all;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{ApiClient, ClientError, ClientResult};

/// Expected payload shape of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A JSON object (summary, profile)
    Object,
    /// A list, sent either bare or wrapped as `{ "data": [...] }`
    List,
}

impl Shape {
    /// Value a slice holds before it has ever loaded
    pub fn default_value(self) -> Value {
        match self {
            Shape::Object => json!({}),
            Shape::List => json!([]),
        }
    }

    /// Bring a payload into the canonical in-memory shape
    pub fn normalize(self, value: Value) -> Value {
        match self {
            Shape::Object if value.is_null() => self.default_value(),
            Shape::Object => value,
            Shape::List => Value::Array(normalize_list(value)),
        }
    }
}

/// Accept a bare array or a `{ "data": [...] }` envelope; anything else is empty
pub fn normalize_list(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// A named sub-request of an aggregate fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub name: String,
    pub path: String,
    pub shape: Shape,
}

impl Endpoint {
    pub fn object(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            shape: Shape::Object,
        }
    }

    pub fn list(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            shape: Shape::List,
        }
    }
}

/// Outcome of an aggregate fetch that was not rejected as unauthorized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    /// Normalized payloads of the sub-requests that succeeded
    pub slices: HashMap<String, Value>,
    /// Errors of the sub-requests that failed
    pub failures: HashMap<String, ClientError>,
}

impl Aggregate {
    /// Whether every sub-request succeeded
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Anything that can perform an aggregate fetch
#[async_trait]
pub trait AggregateSource: Send + Sync {
    async fn fetch_all(&self, endpoints: &[Endpoint]) -> ClientResult<Aggregate>;
}

/// Aggregate fetcher backed by the request client
pub struct AggregateFetcher {
    client: Arc<ApiClient>,
}

impl AggregateFetcher {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }
}

#[async_trait]
impl AggregateSource for AggregateFetcher {
    async fn fetch_all(&self, endpoints: &[Endpoint]) -> ClientResult<Aggregate> {
        let requests = endpoints.iter().map(|endpoint| async move {
            let result = self.client.get(&endpoint.path).await;
            (endpoint, result)
        });
        let results = join_all(requests).await;

        if let Some((endpoint, _)) = results
            .iter()
            .find(|(_, result)| matches!(result, Err(ClientError::Unauthorized)))
        {
            tracing::warn!(slice = %endpoint.name, "Aggregate fetch rejected as unauthorized");
            return Err(ClientError::Unauthorized);
        }

        let mut aggregate = Aggregate::default();
        for (endpoint, result) in results {
            match result {
                Ok(value) => {
                    aggregate
                        .slices
                        .insert(endpoint.name.clone(), endpoint.shape.normalize(value));
                }
                Err(e) => {
                    tracing::warn!(slice = %endpoint.name, error = %e, "Slice fetch failed");
                    aggregate.failures.insert(endpoint.name.clone(), e);
                }
            }
        }

        tracing::debug!(
            loaded = aggregate.slices.len(),
            failed = aggregate.failures.len(),
            "Aggregate fetch settled"
        );

        Ok(aggregate)
    }
}
