//! Error types surfaced by the log search pipeline.
//!
//! Every variant is terminal for the request that raised it: the
//! pipeline performs no retries and never degrades a failed structured
//! query into a plain substring search.

use thiserror::Error;

/// Result alias used throughout the search pipeline.
pub type Result<T> = std::result::Result<T, SearchError>;

/// A logic expression (or fragment of one) that matched no grammar rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot parse logic term: {text}")]
pub struct ParseError {
    /// The substring being parsed when no rule applied.
    pub text: String,
}

impl ParseError {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The document store call failed or returned a non-success status.
    #[error("document store error: {0}")]
    Backend(String),

    /// A `from`/`to` filter could not be parsed as a timestamp.
    #[error("malformed {field} timestamp: {value:?}")]
    MalformedFilter { field: &'static str, value: String },
}

impl SearchError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Backend(format!("request timed out: {err}"))
        } else {
            Self::Backend(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_message_includes_offending_text() {
        let err = SearchError::from(ParseError::new("level:"));
        assert_eq!(err.to_string(), "Cannot parse logic term: level:");
    }

    #[test]
    fn malformed_filter_names_the_field() {
        let err = SearchError::MalformedFilter {
            field: "from",
            value: "yesterday".to_string(),
        };
        assert_eq!(err.to_string(), "malformed from timestamp: \"yesterday\"");
    }
}
