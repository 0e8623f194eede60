//! Tally query - a flat boolean query language for untyped analytics records.
//!
//! Queries look like `country == 'US' and events_count > 100 or platform == 'ios'`
//! and are evaluated against anything that implements [`Fields`], including
//! plain `serde_json` objects.
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tally_query::evaluate_query;
//!
//! let event = json!({
//!     "country": "US",
//!     "events_count": 150,
//!     "platform": "ios",
//!     "nested": { "value": 10 }
//! });
//!
//! assert!(evaluate_query(&event, "country == 'US' and events_count > 100"));
//! assert!(evaluate_query(&event, "nested.value == 10"));
//! assert!(!evaluate_query(&event, "events_count <= 100"));
//! ```
//!
//! # Language
//!
//! | Element | Form |
//! |---------|------|
//! | Condition | `field op literal` |
//! | Field | `[A-Za-z_][A-Za-z0-9_.]*`, dots descend into nested records |
//! | Operator | `==` `!=` `>` `>=` `<` `<=` |
//! | Literal | `'quoted text'`, `42`, `3.5`, or a bare word (text) |
//! | Connective | `and`, `or` (any case) |
//!
//! Conditions fold left to right with no precedence and no parentheses.
//!
//! # Comparison Semantics
//!
//! - `==`/`!=` compare numerically when both sides are numbers (numeric text
//!   counts), and compare text renderings otherwise.
//! - `>`/`>=`/`<`/`<=` are numeric only. Anything non-numeric is NaN, and an
//!   ordering against NaN is always false.
//!
//! # Malformed Queries
//!
//! [`Query::parse`] reports problems as [`QueryError`]. The lenient entry
//! points ([`evaluate_query`], [`Matcher`]) never fail:
//!
//! - text with an unrecognizable tail matches every record;
//! - a non-connective where `and`/`or` belongs matches no record;
//! - a condition cut off by the end of input is false.

mod condition;
mod error;
mod fields;
mod op;
mod query;
mod token;
mod value;

// Re-export public API
pub use condition::{compare, Condition, Literal};
pub use error::{QueryError, Result};
pub use fields::{resolve_path, Fields, Record};
pub use op::Op;
pub use query::{evaluate, evaluate_query, Logic, Matcher, Query, Term};
pub use token::{tokenize, Token, TokenKind};
pub use value::{format_number, string_to_number, Value};
