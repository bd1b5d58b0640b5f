//! Translation of parsed logic expressions into backend-neutral boolean
//! queries, plus their Elasticsearch-style JSON rendering.

use serde_json::{json, Map, Value};
use tracing::warn;

use crate::models::{AstNode, LogTerm, LEVEL_KEYWORD_FIELD, MESSAGE_FIELD};

/// One atomic (or nested) condition in a compiled query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Exact match against a single value.
    TermExact { field: String, value: String },
    /// Full phrase match.
    Phrase { field: String, text: String },
    /// Phrase match where the last word may be a prefix.
    PhrasePrefix { field: String, text: String },
    /// Inclusive range; bounds are RFC 3339 strings.
    DateRange {
        field: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Exact match against any of the values.
    TermsIn { field: String, values: Vec<String> },
    Bool(CompiledQuery),
    /// A term on a field the compiler has no mapping for. Rendered as
    /// nothing, so it neither matches nor excludes documents.
    Ignored { field: String },
}

/// Boolean combination of clauses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledQuery {
    pub must: Vec<Clause>,
    pub should: Vec<Clause>,
    pub must_not: Vec<Clause>,
}

impl CompiledQuery {
    pub fn must(clauses: Vec<Clause>) -> Self {
        Self {
            must: clauses,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.should.is_empty() && self.must_not.is_empty()
    }

    /// Render as an Elasticsearch `bool` query object.
    ///
    /// Empty clause lists are omitted and `Ignored` clauses are
    /// dropped; an entirely empty query renders as `{"bool": {}}`,
    /// which matches every document.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        for (key, clauses) in [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
        ] {
            let rendered: Vec<Value> = clauses.iter().filter_map(Clause::to_json).collect();
            if !rendered.is_empty() {
                body.insert(key.to_string(), Value::Array(rendered));
            }
        }
        json!({ "bool": body })
    }
}

impl Clause {
    /// Render this clause, or `None` for `Ignored`.
    pub fn to_json(&self) -> Option<Value> {
        let value = match self {
            Clause::TermExact { field, value } => json!({ "term": { field.as_str(): value } }),
            Clause::Phrase { field, text } => json!({ "match_phrase": { field.as_str(): text } }),
            Clause::PhrasePrefix { field, text } => {
                json!({ "match_phrase_prefix": { field.as_str(): text } })
            }
            Clause::DateRange { field, from, to } => {
                let mut bounds = Map::new();
                if let Some(from) = from {
                    bounds.insert("gte".to_string(), Value::String(from.clone()));
                }
                if let Some(to) = to {
                    bounds.insert("lte".to_string(), Value::String(to.clone()));
                }
                json!({ "range": { field.as_str(): bounds } })
            }
            Clause::TermsIn { field, values } => json!({ "terms": { field.as_str(): values } }),
            Clause::Bool(query) => query.to_json(),
            Clause::Ignored { .. } => return None,
        };
        Some(value)
    }
}

/// `level:<v>` inside an expression: exact keyword match.
pub fn level_term_clause(value: &str) -> Clause {
    Clause::TermsIn {
        field: LEVEL_KEYWORD_FIELD.to_string(),
        values: vec![value.to_string()],
    }
}

/// `message:<v>` inside an expression: exact phrase match.
pub fn message_term_clause(value: &str) -> Clause {
    Clause::Phrase {
        field: MESSAGE_FIELD.to_string(),
        text: value.to_string(),
    }
}

/// Compile a parsed expression.
///
/// A composite root yields its own clause lists; a lone term yields a
/// query whose `must` holds exactly that term's clause.
pub fn compile(node: &AstNode) -> CompiledQuery {
    match compile_clause(node) {
        Clause::Bool(query) => query,
        clause => CompiledQuery::must(vec![clause]),
    }
}

fn compile_clause(node: &AstNode) -> Clause {
    match node {
        AstNode::And(children) => Clause::Bool(CompiledQuery {
            must: children.iter().map(compile_clause).collect(),
            ..CompiledQuery::default()
        }),
        AstNode::Or(children) => Clause::Bool(CompiledQuery {
            should: children.iter().map(compile_clause).collect(),
            ..CompiledQuery::default()
        }),
        AstNode::Not(child) => Clause::Bool(CompiledQuery {
            must_not: vec![compile_clause(child)],
            ..CompiledQuery::default()
        }),
        AstNode::Term(term) => compile_term(term),
    }
}

fn compile_term(term: &LogTerm) -> Clause {
    match term.field.as_str() {
        "level" => level_term_clause(&term.value),
        "message" => message_term_clause(&term.value),
        other => {
            warn!(field = other, value = %term.value, "ignoring term on unsupported field");
            Clause::Ignored {
                field: other.to_string(),
            }
        }
    }
}
