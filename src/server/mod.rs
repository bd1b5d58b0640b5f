//! HTTP daemon mode for `logsearch`.
//!
//! This module exposes the search service over a small HTTP+JSON API:
//!
//! - `GET /logs?size=<int>` – every log record, oldest first, at most
//!   1000.
//! - `GET /search?query=&level=&from=&to=&size=` – filtered search,
//!   newest first.
//! - `GET /v1/health` – simple health check endpoint.
//!
//! The server is intentionally thin: it decodes query strings,
//! delegates to `LogSearchService`, and converts errors into JSON HTTP
//! responses.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::error::SearchError;
use crate::models::{LogRecord, SearchParams, DEFAULT_SIZE};
use crate::search::engine::LogSearchService;

type SharedService = Arc<LogSearchService>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Default, Deserialize)]
struct LogsParams {
    #[serde(default)]
    size: Option<usize>,
}

/// Error type used by HTTP handlers to map search failures into JSON
/// error responses.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        let status = match err {
            SearchError::Parse(_) | SearchError::MalformedFilter { .. } => StatusCode::BAD_REQUEST,
            SearchError::Backend(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Build the Axum router for the log search API.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/logs", get(logs))
        .route("/search", get(search))
        .with_state(service)
}

/// Run the HTTP server bound to the provided socket address.
pub async fn run(addr: SocketAddr, service: SharedService) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "log search API listening");
    serve_with_listener(listener, service).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(listener: TcpListener, service: SharedService) -> Result<()> {
    axum::serve(listener, router(service)).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn logs(
    State(service): State<SharedService>,
    params: std::result::Result<Query<LogsParams>, QueryRejection>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let Query(params) = params?;
    let records = service
        .get_all(params.size.unwrap_or(DEFAULT_SIZE))
        .await?;
    Ok(Json(records))
}

async fn search(
    State(service): State<SharedService>,
    params: std::result::Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let Query(params) = params?;
    let records = service.search_params(params).await?;
    Ok(Json(records))
}
