//! Conditions: a field path, an operator and a literal.

use std::fmt;

use crate::fields::{resolve_path, Fields};
use crate::op::Op;
use crate::token::{Token, TokenKind};
use crate::value::{format_number, string_to_number, Value};

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Quoted text, or a bare word that is not a number.
    String(String),
    /// A bare numeric token.
    Number(f64),
}

impl Literal {
    /// Reads a literal from a value token.
    ///
    /// Quoted tokens lose their quotes and are never numeric. Bare tokens are
    /// numbers when they convert cleanly, text otherwise.
    pub fn from_token(token: &Token<'_>) -> Literal {
        if token.kind == TokenKind::Quoted {
            let inner = &token.text[1..token.text.len() - 1];
            return Literal::String(inner.to_string());
        }
        let n = string_to_number(token.text);
        if n.is_nan() {
            Literal::String(token.text.to_string())
        } else {
            Literal::Number(n)
        }
    }

    /// Borrows the literal as a runtime value.
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Literal::String(s) => Value::String(s),
            Literal::Number(n) => Value::Number(*n),
        }
    }
}

impl From<&str> for Literal {
    fn from(s: &str) -> Self {
        Literal::String(s.to_string())
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<i64> for Literal {
    fn from(n: i64) -> Self {
        Literal::Number(n as f64)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Number(n) => f.write_str(&format_number(*n)),
        }
    }
}

/// A single predicate such as `events_count > 100`.
///
/// `op` is `None` when the operator slot held a token that is not an
/// operator; such a condition never matches.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Dot-separated field path.
    pub field: String,
    /// The comparison operator.
    pub op: Option<Op>,
    /// The value to compare against.
    pub value: Literal,
}

impl Condition {
    /// Creates a new condition.
    ///
    /// Any string value is accepted and matches as given, but the query text
    /// has no escapes. A string value containing `'` renders as text that
    /// [`Query::parse`](crate::Query::parse) rejects, and a field starting
    /// with lowercase `and` or `or` renders as text that parses differently.
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Literal>) -> Self {
        Condition {
            field: field.into(),
            op: Some(op),
            value: value.into(),
        }
    }

    /// Builds a condition from three consecutive tokens.
    pub(crate) fn from_tokens(field: &Token<'_>, op: &Token<'_>, value: &Token<'_>) -> Self {
        Condition {
            field: field.text.to_string(),
            op: Op::parse(op.text),
            value: Literal::from_token(value),
        }
    }

    /// Evaluates this condition against a record.
    pub fn matches<R: Fields + ?Sized>(&self, record: &R) -> bool {
        let Some(op) = self.op else {
            return false;
        };
        let left = resolve_path(record, &self.field);
        compare(&left, op, &self.value.as_value())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.op.map(Op::as_str).unwrap_or("?");
        write!(f, "{} {} {}", self.field, op, self.value)
    }
}

/// Compares two values under an operator.
///
/// Equality is numeric when both sides are numbers and textual otherwise.
/// Ordering is always numeric; a non-numeric side is NaN and every ordering
/// against NaN is false.
pub fn compare(left: &Value<'_>, op: Op, right: &Value<'_>) -> bool {
    match op {
        Op::Eq => loosely_equal(left, right),
        Op::Ne => !loosely_equal(left, right),
        _ => {
            let a = left.as_number().unwrap_or(f64::NAN);
            let b = right.as_number().unwrap_or(f64::NAN);
            op.eval_ordering(a.partial_cmp(&b))
        }
    }
}

fn loosely_equal(left: &Value<'_>, right: &Value<'_>) -> bool {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => a == b,
        _ => left.to_text() == right.to_text(),
    }
}
