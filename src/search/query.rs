//! Logic expression classification and parsing.
//!
//! The expression language is deliberately small:
//! - `field:value` or `field:"quoted value"` terms.
//! - Binary ` AND ` / ` OR ` splits at paren depth zero.
//! - A leading `NOT ` negates the rest of the expression.
//! - One outer pair of parentheses is stripped before splitting.
//!
//! Precedence is positional: the first depth-zero operator in reading
//! order governs the split, whichever kind it is. `a:1 OR b:2 AND c:3`
//! therefore parses as `a:1 OR (b:2 AND c:3)`, while
//! `a:1 AND b:2 OR c:3` parses as `a:1 AND (b:2 OR c:3)`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ParseError;
use crate::models::{AstNode, LogTerm};

const AND_OPERATOR: &str = " AND ";
const OR_OPERATOR: &str = " OR ";
const NOT_PREFIX: &str = "NOT ";

static TERM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\w+):(?:"(.*)"|([^\s()]+))$"#).expect("term pattern is valid")
});

/// Whether `text` should be treated as a logic expression rather than
/// a plain substring search.
///
/// This is a literal substring check, so keywords inside quoted values
/// (e.g. `message:"ORDER failed"`) also classify as expressions.
pub fn is_logic_expression(text: &str) -> bool {
    ["AND", "OR", "NOT", "("]
        .iter()
        .any(|marker| text.contains(marker))
}

/// Parse a logic expression into an `AstNode` tree.
///
/// The outer-paren strip only checks the first and last characters, so
/// `(a:1) AND (b:2)` loses its balance and fails to parse.
pub fn parse_logic_expression(input: &str) -> Result<AstNode, ParseError> {
    let mut text = input.trim();

    if text.starts_with('(') && text.ends_with(')') && text.len() >= 2 {
        text = text[1..text.len() - 1].trim();
    }

    if let Some(node) = split_top_level(text)? {
        return Ok(node);
    }

    if let Some(rest) = text.strip_prefix(NOT_PREFIX) {
        let child = parse_logic_expression(rest)?;
        return Ok(AstNode::Not(Box::new(child)));
    }

    parse_term(text)
        .map(AstNode::Term)
        .ok_or_else(|| ParseError::new(text))
}

/// Split at the first depth-zero ` AND ` or ` OR `, checking AND first
/// at each position.
fn split_top_level(text: &str) -> Result<Option<AstNode>, ParseError> {
    let mut depth: i32 = 0;

    for (idx, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ if depth == 0 => {
                let rest = &text[idx..];
                if rest.starts_with(AND_OPERATOR) {
                    let (left, right) = split_children(text, idx, AND_OPERATOR.len())?;
                    return Ok(Some(AstNode::And(vec![left, right])));
                }
                if rest.starts_with(OR_OPERATOR) {
                    let (left, right) = split_children(text, idx, OR_OPERATOR.len())?;
                    return Ok(Some(AstNode::Or(vec![left, right])));
                }
            }
            _ => {}
        }
    }

    Ok(None)
}

fn split_children(
    text: &str,
    idx: usize,
    operator_len: usize,
) -> Result<(AstNode, AstNode), ParseError> {
    let left = parse_logic_expression(&text[..idx])?;
    let right = parse_logic_expression(&text[idx + operator_len..])?;
    Ok((left, right))
}

fn parse_term(text: &str) -> Option<LogTerm> {
    let captures = TERM_PATTERN.captures(text)?;
    let field = captures.get(1)?.as_str().to_string();
    let value = captures
        .get(2)
        .or_else(|| captures.get(3))
        .map(|m| m.as_str().to_string())?;
    Some(LogTerm { field, value })
}
