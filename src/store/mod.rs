//! Document store abstraction.
//!
//! The `DocumentStore` trait is the seam between the search pipeline
//! and the backend that holds log documents. The service ships with an
//! Elasticsearch-compatible implementation; tests substitute recording
//! doubles.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;
use crate::models::{LogDocument, SortOrder, TIMESTAMP_FIELD};
use crate::search::compile::CompiledQuery;

pub mod elastic;

pub use elastic::{ElasticConfig, ElasticStore};

/// Query portion of a store request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryBody {
    MatchAll,
    Bool(CompiledQuery),
}

/// A fully composed request handed to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub query: QueryBody,
    pub size: usize,
    /// Sort direction on `@timestamp`.
    pub sort: SortOrder,
}

impl StoreQuery {
    /// Render the `_search` request body.
    pub fn to_json(&self) -> Value {
        let query = match &self.query {
            QueryBody::MatchAll => json!({ "match_all": {} }),
            QueryBody::Bool(compiled) => compiled.to_json(),
        };
        json!({
            "size": self.size,
            "sort": [ { TIMESTAMP_FIELD: { "order": self.sort.as_str() } } ],
            "query": query,
        })
    }
}

/// Pluggable document store used by the search service.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Make sure the target index exists, creating it if needed.
    ///
    /// Must be idempotent: concurrent callers may race, and an
    /// "already exists" answer counts as success.
    async fn ensure_index(&self) -> Result<()>;

    /// Execute a query and return the matching documents in order.
    async fn search(&self, query: &StoreQuery) -> Result<Vec<LogDocument>>;
}
