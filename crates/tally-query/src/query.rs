//! Query parsing and evaluation.
//!
//! A [`Query`] is a flat chain of conditions joined by `and`/`or`. There is no
//! precedence and no grouping: the chain folds strictly left to right, so
//! `a or b and c` means `(a or b) and c`.
//!
//! Two entry points exist. [`Query::parse`] and [`evaluate`] are strict and
//! report malformed input as [`QueryError`]. [`evaluate_query`] and
//! [`Matcher`] are lenient: they substitute each error's fixed outcome so a
//! dashboard never stops filtering because of a half-typed query.

use std::fmt;

use tracing::debug;

use crate::condition::{Condition, Literal};
use crate::error::{QueryError, Result};
use crate::fields::Fields;
use crate::op::Op;
use crate::token::{tokenize, Token};

/// Logical connective between two terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    /// Parses a connective, ignoring case.
    pub fn parse(token: &str) -> Option<Logic> {
        if token.eq_ignore_ascii_case("and") {
            Some(Logic::And)
        } else if token.eq_ignore_ascii_case("or") {
            Some(Logic::Or)
        } else {
            None
        }
    }

    /// Returns the lowercase spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "and",
            Logic::Or => "or",
        }
    }
}

/// One operand of the chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// A full condition.
    Condition(Condition),
    /// A condition cut short by the end of input. Always false.
    Incomplete(Vec<String>),
}

impl Term {
    fn matches<R: Fields + ?Sized>(&self, record: &R) -> bool {
        match self {
            Term::Condition(condition) => condition.matches(record),
            Term::Incomplete(_) => false,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Condition(condition) => fmt::Display::fmt(condition, f),
            Term::Incomplete(parts) => f.write_str(&parts.join(" ")),
        }
    }
}

/// A parsed query.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tally_query::Query;
///
/// let query = Query::parse("country == 'US' and events_count > 100").unwrap();
/// assert!(query.matches(&json!({"country": "US", "events_count": 150})));
/// assert!(!query.matches(&json!({"country": "US", "events_count": 50})));
/// ```
///
/// Queries can also be assembled directly:
///
/// ```
/// use tally_query::{Op, Query};
///
/// let query = Query::new()
///     .and("country", Op::Eq, "CA")
///     .or("platform", Op::Eq, "ios");
/// assert_eq!(query.to_string(), "country == 'CA' or platform == 'ios'");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    head: Option<Term>,
    tail: Vec<(Logic, Term)>,
}

impl Query {
    /// Creates a new empty query.
    ///
    /// An empty query matches all records.
    pub fn new() -> Self {
        Query::default()
    }

    /// Parses query text.
    ///
    /// Blank text parses to the empty query.
    pub fn parse(text: &str) -> Result<Query> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Ok(Query::default());
        }

        let mut idx = 0;
        let head = read_term(&tokens, &mut idx);
        let mut tail = Vec::new();

        while idx < tokens.len() {
            let connective = &tokens[idx];
            idx += 1;
            let logic = Logic::parse(connective.text).ok_or_else(|| {
                QueryError::InvalidConnective {
                    offset: connective.offset,
                    found: connective.text.to_string(),
                }
            })?;
            tail.push((logic, read_term(&tokens, &mut idx)));
        }

        Ok(Query {
            head: Some(head),
            tail,
        })
    }

    // ========================================================================
    // Builders
    // ========================================================================

    /// Appends a condition joined with `and`.
    ///
    /// On an empty query this becomes the first condition.
    pub fn and(self, field: &str, op: Op, value: impl Into<Literal>) -> Self {
        self.push(Logic::And, Condition::new(field, op, value))
    }

    /// Appends a condition joined with `or`.
    ///
    /// On an empty query this becomes the first condition.
    pub fn or(self, field: &str, op: Op, value: impl Into<Literal>) -> Self {
        self.push(Logic::Or, Condition::new(field, op, value))
    }

    fn push(mut self, logic: Logic, condition: Condition) -> Self {
        let term = Term::Condition(condition);
        if self.head.is_none() {
            self.head = Some(term);
        } else {
            self.tail.push((logic, term));
        }
        self
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns `true` if this query has no conditions (matches everything).
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the number of terms in the chain.
    pub fn len(&self) -> usize {
        usize::from(self.head.is_some()) + self.tail.len()
    }

    /// Iterates over the terms with the connective that precedes each one.
    /// The first term has no connective.
    pub fn terms(&self) -> impl Iterator<Item = (Option<Logic>, &Term)> {
        self.head
            .iter()
            .map(|t| (None, t))
            .chain(self.tail.iter().map(|(l, t)| (Some(*l), t)))
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Tests if a single record matches this query.
    pub fn matches<R: Fields + ?Sized>(&self, record: &R) -> bool {
        let Some(head) = &self.head else {
            return true;
        };
        self.tail
            .iter()
            .fold(head.matches(record), |acc, (logic, term)| {
                let next = term.matches(record);
                match logic {
                    Logic::And => acc && next,
                    Logic::Or => acc || next,
                }
            })
    }

    /// Filters a slice, returning references to matching records in order.
    pub fn filter<'a, R: Fields>(&self, records: &'a [R]) -> Vec<&'a R> {
        records.iter().filter(|r| self.matches(*r)).collect()
    }

    /// Counts the number of matching records.
    pub fn count<R: Fields>(&self, records: &[R]) -> usize {
        records.iter().filter(|r| self.matches(*r)).count()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (logic, term) in self.terms() {
            if let Some(logic) = logic {
                write!(f, " {} ", logic.as_str())?;
            }
            fmt::Display::fmt(term, f)?;
        }
        Ok(())
    }
}

fn read_term(tokens: &[Token<'_>], idx: &mut usize) -> Term {
    let start = *idx;
    *idx += 3;
    match tokens.get(start..start + 3) {
        Some([field, op, value]) => Term::Condition(Condition::from_tokens(field, op, value)),
        _ => Term::Incomplete(
            tokens[start.min(tokens.len())..]
                .iter()
                .map(|t| t.text.to_string())
                .collect(),
        ),
    }
}

/// Parses and evaluates a query against one record, reporting malformed
/// input as an error.
pub fn evaluate<R: Fields + ?Sized>(record: &R, query: &str) -> Result<bool> {
    Ok(Query::parse(query)?.matches(record))
}

/// Evaluates a query against one record.
///
/// Never fails. Blank queries and queries that do not tokenize match every
/// record; a chain with a bad connective matches none.
///
/// ```
/// use serde_json::json;
/// use tally_query::evaluate_query;
///
/// let rec = json!({"country": "CA", "platform": "ios"});
/// assert!(evaluate_query(&rec, ""));
/// assert!(evaluate_query(&rec, "country == 'CA' or platform == 'ios'"));
/// assert!(!evaluate_query(&rec, "country == 'CA' and platform == 'android'"));
/// ```
pub fn evaluate_query<R: Fields + ?Sized>(record: &R, query: &str) -> bool {
    evaluate(record, query).unwrap_or_else(|err| err.lenient_outcome())
}

/// A query compiled once for repeated lenient evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// Matches every record.
    All,
    /// Matches no record.
    Nothing,
    /// Matches records that satisfy the query.
    Query(Query),
}

impl Matcher {
    /// Compiles query text, substituting the lenient outcome on error.
    pub fn compile(text: &str) -> Matcher {
        if text.trim().is_empty() {
            return Matcher::All;
        }
        match Query::parse(text) {
            Ok(query) => Matcher::Query(query),
            Err(err) => {
                debug!(query = %text, error = %err, "query rejected, using lenient outcome");
                if err.lenient_outcome() {
                    Matcher::All
                } else {
                    Matcher::Nothing
                }
            }
        }
    }

    /// Tests a record.
    pub fn matches<R: Fields + ?Sized>(&self, record: &R) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Nothing => false,
            Matcher::Query(query) => query.matches(record),
        }
    }
}
