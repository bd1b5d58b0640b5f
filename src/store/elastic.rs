use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{Result, SearchError};
use crate::models::LogDocument;
use crate::store::{DocumentStore, StoreQuery};

pub const DEFAULT_URL: &str = "http://127.0.0.1:9200";
pub const DEFAULT_INDEX: &str = "registry-logs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for an Elasticsearch-compatible store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElasticConfig {
    /// Base URL, e.g. "http://127.0.0.1:9200".
    pub url: String,
    /// Index holding the log documents.
    pub index: String,
    /// Per-request timeout; expiry surfaces as a backend error.
    pub timeout: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ElasticConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            index: DEFAULT_INDEX.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            username: None,
            password: None,
        }
    }
}

/// Document store backed by the Elasticsearch REST API.
pub struct ElasticStore {
    client: Client,
    base_url: String,
    index: String,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: LogDocument,
}

impl ElasticStore {
    pub fn new(config: ElasticConfig) -> anyhow::Result<Self> {
        let base_url = config.url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            index: config.index,
            username: config.username,
            password: config.password,
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url_for(path);
        debug!(%method, %url, "document store request");
        let builder = self.client.request(method, url);
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_deref()),
            None => builder,
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Mapping used when the index has to be created.
///
/// `level` keeps a `keyword` sub-field for exact filters; `message`
/// stays full-text for phrase matching.
pub fn index_mapping() -> Value {
    json!({
        "mappings": {
            "properties": {
                "@timestamp": { "type": "date" },
                "level": {
                    "type": "text",
                    "fields": { "keyword": { "type": "keyword", "ignore_above": 256 } }
                },
                "message": { "type": "text" },
                "exception": { "type": "text" },
                "fields": {
                    "properties": {
                        "Application": { "type": "keyword" }
                    }
                }
            }
        }
    })
}

async fn backend_failure(context: &str, response: reqwest::Response) -> SearchError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SearchError::backend(format!("{context} returned {status}: {body}"))
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn ensure_index(&self) -> Result<()> {
        let response = self.request(Method::HEAD, &self.index).send().await?;
        match response.status() {
            status if status.is_success() => return Ok(()),
            StatusCode::NOT_FOUND => {}
            _ => return Err(backend_failure("index existence check", response).await),
        }

        let response = self
            .request(Method::PUT, &self.index)
            .json(&index_mapping())
            .send()
            .await?;

        if response.status().is_success() {
            info!(index = %self.index, "created log index");
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::BAD_REQUEST && body.contains("resource_already_exists_exception") {
            debug!(index = %self.index, "log index created concurrently");
            return Ok(());
        }

        Err(SearchError::backend(format!(
            "index creation returned {status}: {body}"
        )))
    }

    async fn search(&self, query: &StoreQuery) -> Result<Vec<LogDocument>> {
        let path = format!("{}/_search", self.index);
        let response = self
            .request(Method::POST, &path)
            .json(&query.to_json())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_failure("search", response).await);
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(|hit| hit.source).collect())
    }
}
