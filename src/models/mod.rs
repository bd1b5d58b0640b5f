//! Shared data models for log search requests, stored documents, and
//! normalized results.
//!
//! `SearchParams` and `LogRecord` form the JSON surface used by the
//! HTTP daemon and the CLI; `LogDocument` mirrors what the log
//! ingestion pipeline writes into the document store.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::{Result, SearchError};

/// Hard ceiling applied to `get_all` result sizes.
pub const MAX_GET_ALL_SIZE: usize = 1000;

/// Result size used when a caller omits `size`.
pub const DEFAULT_SIZE: usize = 100;

/// Timestamp field every log document carries.
pub const TIMESTAMP_FIELD: &str = "@timestamp";

/// Exact-match sub-field used for severity filters.
pub const LEVEL_KEYWORD_FIELD: &str = "level.keyword";

/// Full-text message field.
pub const MESSAGE_FIELD: &str = "message";

/// Sort direction on `@timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// A single `field:value` predicate such as `level:Error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogTerm {
    /// Bare identifier (letters, digits, underscore); never empty.
    pub field: String,
    /// Bare token, or the verbatim interior of a quoted string.
    pub value: String,
}

/// Parsed logic expression.
///
/// `And`/`Or` produced by the parser always hold exactly two children
/// since every split is binary. Trees are built bottom-up and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AstNode {
    And(Vec<AstNode>),
    Or(Vec<AstNode>),
    Not(Box<AstNode>),
    Term(LogTerm),
}

impl AstNode {
    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        AstNode::Term(LogTerm {
            field: field.into(),
            value: value.into(),
        })
    }
}

/// A typed search request consumed by the orchestrator.
///
/// Timestamps are already UTC-normalized; use
/// [`SearchParams::into_request`] to build one from raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Logic expression or free text. `None` or blank searches
    /// everything within the auxiliary filters.
    pub query: Option<String>,
    /// Severity filter; may hold several comma-separated levels.
    pub level: Option<String>,
    /// Inclusive lower bound on `@timestamp`.
    pub from: Option<OffsetDateTime>,
    /// Inclusive upper bound on `@timestamp`.
    pub to: Option<OffsetDateTime>,
    /// Result cap forwarded to the store as-is.
    pub size: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, size: usize) -> Self {
        Self {
            query: Some(query.into()),
            level: None,
            from: None,
            to: None,
            size,
        }
    }
}

/// Raw, string-typed request parameters as received from the HTTP
/// query string or the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub size: Option<usize>,
}

impl SearchParams {
    /// Validate and convert into a typed `SearchRequest`.
    ///
    /// Empty strings are treated as absent. A timestamp that does not
    /// parse fails with `SearchError::MalformedFilter`.
    pub fn into_request(self) -> Result<SearchRequest> {
        let from = non_empty(self.from)
            .map(|raw| parse_timestamp("from", &raw))
            .transpose()?;
        let to = non_empty(self.to)
            .map(|raw| parse_timestamp("to", &raw))
            .transpose()?;

        Ok(SearchRequest {
            query: non_empty(self.query),
            level: non_empty(self.level),
            from,
            to,
            size: self.size.unwrap_or(DEFAULT_SIZE),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a filter timestamp and normalize it to UTC.
///
/// Accepted forms:
/// - RFC 3339 with an offset (`2024-05-01T10:00:00+02:00`).
/// - A date-time without offset (`2024-05-01T10:00:00`), taken as UTC.
/// - A bare date (`2024-05-01`), taken as midnight UTC.
pub fn parse_timestamp(field: &'static str, raw: &str) -> Result<OffsetDateTime> {
    let value = raw.trim();
    let malformed = || SearchError::MalformedFilter {
        field,
        value: raw.to_string(),
    };

    let parsed = if let Ok(ts) = OffsetDateTime::parse(value, &Rfc3339) {
        ts.to_offset(UtcOffset::UTC)
    } else if let Ok(ts) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        ts.assume_utc()
    } else if let Ok(ts) = PrimitiveDateTime::parse(
        value,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    ) {
        ts.assume_utc()
    } else if let Ok(date) = Date::parse(value, format_description!("[year]-[month]-[day]")) {
        date.midnight().assume_utc()
    } else {
        return Err(malformed());
    };

    // Bounds are sent to the store as RFC 3339, which cannot express
    // every year `time` can hold.
    parsed.format(&Rfc3339).map_err(|_| malformed())?;
    Ok(parsed)
}

/// Render a UTC timestamp the way the document store expects it.
pub fn format_timestamp(ts: OffsetDateTime) -> String {
    ts.format(&Rfc3339).unwrap_or_else(|_| ts.to_string())
}

/// Nested `fields` object written by the ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    #[serde(rename = "Application", default)]
    pub application: Option<String>,
}

/// A log document as stored in the search backend (`_source`).
///
/// Decoding is lenient: a non-string `@timestamp` (e.g. epoch millis)
/// is kept as its JSON text, and `exception` may hold any JSON value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDocument {
    #[serde(rename = "@timestamp", default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub exception: Option<Value>,
    #[serde(default)]
    pub fields: Option<DocumentFields>,
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// A normalized log entry returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: String,
    pub message: String,
    pub exception: String,
    pub application: String,
}

impl From<LogDocument> for LogRecord {
    /// Missing fields become empty strings. `exception` is always
    /// emitted empty; the stored exception text is not surfaced.
    fn from(doc: LogDocument) -> Self {
        LogRecord {
            timestamp: doc.timestamp.unwrap_or_default(),
            level: doc.level.unwrap_or_default(),
            message: doc.message.unwrap_or_default(),
            exception: String::new(),
            application: doc
                .fields
                .and_then(|fields| fields.application)
                .unwrap_or_default(),
        }
    }
}
