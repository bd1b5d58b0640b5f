//! Search orchestration.
//!
//! `LogSearchService` drives classify → parse → compile → compose for a
//! request, makes sure the backing index exists, executes the composed
//! query against the injected `DocumentStore`, and normalizes the hits
//! into `LogRecord`s.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::Result;
use crate::models::{LogRecord, SearchParams, SearchRequest, SortOrder, MAX_GET_ALL_SIZE};
use crate::search::filters::compose_query;
use crate::store::{DocumentStore, QueryBody, StoreQuery};

/// Build the store request for `get_all`: match everything, oldest
/// first, at most `MAX_GET_ALL_SIZE` hits.
pub fn plan_get_all(size: usize) -> StoreQuery {
    StoreQuery {
        query: QueryBody::MatchAll,
        size: size.min(MAX_GET_ALL_SIZE),
        sort: SortOrder::Asc,
    }
}

/// Build the store request for `search`: newest first, `size`
/// forwarded without a cap.
pub fn plan_search(request: &SearchRequest) -> Result<StoreQuery> {
    let compiled = compose_query(request)?;
    Ok(StoreQuery {
        query: QueryBody::Bool(compiled),
        size: request.size,
        sort: SortOrder::Desc,
    })
}

pub struct LogSearchService {
    store: Arc<dyn DocumentStore>,
    index_ready: OnceCell<()>,
}

impl LogSearchService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            index_ready: OnceCell::new(),
        }
    }

    /// Return up to `size` (capped at 1000) log records, oldest first,
    /// ignoring all filters.
    pub async fn get_all(&self, size: usize) -> Result<Vec<LogRecord>> {
        self.execute(plan_get_all(size)).await
    }

    /// Run a typed search request.
    pub async fn search(&self, request: SearchRequest) -> Result<Vec<LogRecord>> {
        let query = plan_search(&request)?;
        self.execute(query).await
    }

    /// Run a search from raw parameters.
    ///
    /// Timestamp filters are validated before the store is touched.
    pub async fn search_params(&self, params: SearchParams) -> Result<Vec<LogRecord>> {
        let request = params.into_request()?;
        self.search(request).await
    }

    /// Ensure the index exists once per service lifetime.
    ///
    /// A failed attempt leaves the cell empty so the next call retries.
    pub async fn ensure_index(&self) -> Result<()> {
        self.index_ready
            .get_or_try_init(|| self.store.ensure_index())
            .await?;
        Ok(())
    }

    async fn execute(&self, query: StoreQuery) -> Result<Vec<LogRecord>> {
        self.ensure_index().await?;

        debug!(body = %query.to_json(), "executing log query");
        let documents = self.store.search(&query).await?;
        Ok(documents.into_iter().map(LogRecord::from).collect())
    }
}
