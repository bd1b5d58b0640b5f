//! Query composition for the two search paths.
//!
//! The structured path compiles a logic expression and wraps it with
//! the auxiliary filters; the plain path builds a flat `must` list from
//! the filters and a phrase-prefix match on the free text.
//!
//! `message` and `level` are matched differently depending on the
//! path, so each path has its own clause builders.

use time::OffsetDateTime;
use tracing::debug;

use crate::error::ParseError;
use crate::models::{
    format_timestamp, SearchRequest, LEVEL_KEYWORD_FIELD, MESSAGE_FIELD, TIMESTAMP_FIELD,
};
use crate::search::compile::{compile, Clause, CompiledQuery};
use crate::search::query::{is_logic_expression, parse_logic_expression};

/// `@timestamp` range, or `None` when neither bound is set.
pub fn timestamp_range_clause(
    from: Option<OffsetDateTime>,
    to: Option<OffsetDateTime>,
) -> Option<Clause> {
    if from.is_none() && to.is_none() {
        return None;
    }
    Some(Clause::DateRange {
        field: TIMESTAMP_FIELD.to_string(),
        from: from.map(format_timestamp),
        to: to.map(format_timestamp),
    })
}

/// Level filter merged next to a compiled expression: always a
/// `terms` clause over the comma-separated levels.
pub fn structured_level_clause(level: &str) -> Clause {
    Clause::TermsIn {
        field: LEVEL_KEYWORD_FIELD.to_string(),
        values: split_levels(level),
    }
}

/// Level filter on the plain path: a single level is an exact `term`
/// match; several comma-separated levels become a `terms` clause.
pub fn plain_level_clause(level: &str) -> Clause {
    let mut values = split_levels(level);
    if values.len() == 1 {
        Clause::TermExact {
            field: LEVEL_KEYWORD_FIELD.to_string(),
            value: values.remove(0),
        }
    } else {
        Clause::TermsIn {
            field: LEVEL_KEYWORD_FIELD.to_string(),
            values,
        }
    }
}

/// Phrase-prefix match on free text. `message:` terms inside an
/// expression use the exact phrase match of
/// [`message_term_clause`](crate::search::compile::message_term_clause).
pub fn plain_message_clause(text: &str) -> Clause {
    Clause::PhrasePrefix {
        field: MESSAGE_FIELD.to_string(),
        text: text.to_string(),
    }
}

fn split_levels(level: &str) -> Vec<String> {
    level
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn has_levels(level: Option<&str>) -> Option<&str> {
    level.filter(|l| l.split(',').any(|v| !v.trim().is_empty()))
}

/// Build the backend query for a request, choosing the path from the
/// classifier's verdict on `request.query`.
pub fn compose_query(request: &SearchRequest) -> Result<CompiledQuery, ParseError> {
    let text = request.query.as_deref().map(str::trim).filter(|t| !t.is_empty());

    let query = match text {
        Some(text) if is_logic_expression(text) => {
            debug!(query = text, "composing structured query");
            let ast = parse_logic_expression(text)?;
            compose_structured(compile(&ast), request)
        }
        _ => {
            debug!(query = ?text, "composing plain query");
            compose_plain(text, request)
        }
    };

    Ok(query)
}

/// Wrap a compiled expression with the auxiliary filters.
///
/// Without filters the compiled query is returned untouched.
pub fn compose_structured(base: CompiledQuery, request: &SearchRequest) -> CompiledQuery {
    let mut auxiliary = Vec::new();
    if let Some(range) = timestamp_range_clause(request.from, request.to) {
        auxiliary.push(range);
    }
    if let Some(level) = has_levels(request.level.as_deref()) {
        auxiliary.push(structured_level_clause(level));
    }

    if auxiliary.is_empty() {
        return base;
    }

    let mut must = Vec::with_capacity(auxiliary.len() + 1);
    must.push(Clause::Bool(base));
    must.extend(auxiliary);
    CompiledQuery::must(must)
}

/// Flat `must` list: range, level, then the free-text prefix match.
pub fn compose_plain(text: Option<&str>, request: &SearchRequest) -> CompiledQuery {
    let mut must = Vec::new();
    if let Some(range) = timestamp_range_clause(request.from, request.to) {
        must.push(range);
    }
    if let Some(level) = has_levels(request.level.as_deref()) {
        must.push(plain_level_clause(level));
    }
    if let Some(text) = text {
        must.push(plain_message_clause(text));
    }
    CompiledQuery::must(must)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::compile::{level_term_clause, message_term_clause};
    use serde_json::json;
    use time::macros::datetime;

    fn request(query: Option<&str>, level: Option<&str>) -> SearchRequest {
        SearchRequest {
            query: query.map(str::to_string),
            level: level.map(str::to_string),
            from: None,
            to: None,
            size: 10,
        }
    }

    #[test]
    fn structured_term_without_filters_is_not_wrapped() {
        let query = compose_query(&request(Some("level:Error"), None)).expect("query");
        assert_eq!(query.must, vec![level_term_clause("Error")]);
        assert!(query.should.is_empty());
        assert!(query.must_not.is_empty());
    }

    #[test]
    fn plain_text_with_levels_uses_prefix_match_and_split_levels() {
        let query =
            compose_query(&request(Some("timeout"), Some("Error,Warning"))).expect("query");
        assert_eq!(
            query.must,
            vec![
                Clause::TermsIn {
                    field: "level.keyword".to_string(),
                    values: vec!["Error".to_string(), "Warning".to_string()],
                },
                Clause::PhrasePrefix {
                    field: "message".to_string(),
                    text: "timeout".to_string(),
                },
            ]
        );
    }

    #[test]
    fn plain_single_level_is_an_exact_term() {
        assert_eq!(
            plain_level_clause("Error"),
            Clause::TermExact {
                field: "level.keyword".to_string(),
                value: "Error".to_string(),
            }
        );
        assert_eq!(
            structured_level_clause("Error"),
            Clause::TermsIn {
                field: "level.keyword".to_string(),
                values: vec!["Error".to_string()],
            }
        );
    }

    #[test]
    fn message_matching_differs_between_paths() {
        assert_eq!(
            message_term_clause("disk full").to_json(),
            Some(json!({ "match_phrase": { "message": "disk full" } }))
        );
        assert_eq!(
            plain_message_clause("disk full").to_json(),
            Some(json!({ "match_phrase_prefix": { "message": "disk full" } }))
        );
    }

    #[test]
    fn structured_query_is_wrapped_with_range_then_level() {
        let mut req = request(Some("message:timeout OR message:retry"), Some("Error, Fatal"));
        req.from = Some(datetime!(2024-05-01 00:00:00 UTC));
        req.to = Some(datetime!(2024-05-02 00:00:00 UTC));

        let query = compose_query(&req).expect("query");
        assert_eq!(
            query.to_json(),
            json!({
                "bool": {
                    "must": [
                        {
                            "bool": {
                                "should": [
                                    { "match_phrase": { "message": "timeout" } },
                                    { "match_phrase": { "message": "retry" } }
                                ]
                            }
                        },
                        {
                            "range": {
                                "@timestamp": {
                                    "gte": "2024-05-01T00:00:00Z",
                                    "lte": "2024-05-02T00:00:00Z"
                                }
                            }
                        },
                        { "terms": { "level.keyword": ["Error", "Fatal"] } }
                    ]
                }
            })
        );
    }

    #[test]
    fn range_with_single_bound_is_still_merged() {
        let mut req = request(Some("level:Error"), None);
        req.to = Some(datetime!(2024-05-02 12:00:00 UTC));

        let query = compose_query(&req).expect("query");
        assert_eq!(query.must.len(), 2);
        assert_eq!(
            query.must[1],
            Clause::DateRange {
                field: "@timestamp".to_string(),
                from: None,
                to: Some("2024-05-02T12:00:00Z".to_string()),
            }
        );
    }

    #[test]
    fn plain_path_orders_range_then_level_then_prefix() {
        let mut req = request(Some("timeout"), Some("Error"));
        req.from = Some(datetime!(2024-05-01 10:00:00 UTC));
        req.to = Some(datetime!(9999-12-31 23:59:59 UTC));

        let query = compose_query(&req).expect("query");
        assert_eq!(
            query.must,
            vec![
                Clause::DateRange {
                    field: "@timestamp".to_string(),
                    from: Some("2024-05-01T10:00:00Z".to_string()),
                    to: Some("9999-12-31T23:59:59Z".to_string()),
                },
                Clause::TermExact {
                    field: "level.keyword".to_string(),
                    value: "Error".to_string(),
                },
                Clause::PhrasePrefix {
                    field: "message".to_string(),
                    text: "timeout".to_string(),
                },
            ]
        );

        let mut req = request(Some("timeout"), None);
        req.from = Some(datetime!(2024-05-01 10:00:00 UTC));
        let query = compose_query(&req).expect("query");
        assert_eq!(query.must.len(), 2);
        assert!(matches!(query.must[0], Clause::DateRange { to: None, .. }));
        assert_eq!(query.must[1], plain_message_clause("timeout"));
    }

    #[test]
    fn absent_query_takes_plain_path_with_filters_only() {
        let query = compose_query(&request(None, Some("Warning"))).expect("query");
        assert_eq!(query.must, vec![plain_level_clause("Warning")]);

        let query = compose_query(&request(Some("   "), None)).expect("query");
        assert!(query.is_empty());
        assert_eq!(query.to_json(), json!({ "bool": {} }));
    }

    #[test]
    fn parse_errors_do_not_fall_back_to_plain_search() {
        let err = compose_query(&request(Some("level:Error AND ???"), None)).expect_err("parse");
        assert_eq!(err.text, "???");
    }
}
