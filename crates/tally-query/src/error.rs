//! Error types for the query crate.

use thiserror::Error;

/// Errors raised while reading a query string.
///
/// Each variant has a fixed lenient outcome, see [`QueryError::lenient_outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Input that no token pattern recognizes.
    #[error("unrecognized input at offset {offset}: {fragment:?}")]
    Tokenize { offset: usize, fragment: String },

    /// A token in connective position that is neither `and` nor `or`.
    #[error("expected 'and' or 'or' at offset {offset}, found {found:?}")]
    InvalidConnective { offset: usize, found: String },
}

impl QueryError {
    /// The boolean a lenient caller substitutes for this error.
    ///
    /// An untokenizable query degrades to "no conditions" and matches every
    /// record. A broken connective chain matches nothing.
    pub fn lenient_outcome(&self) -> bool {
        match self {
            QueryError::Tokenize { .. } => true,
            QueryError::InvalidConnective { .. } => false,
        }
    }
}

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_outcomes() {
        let tokenize = QueryError::Tokenize {
            offset: 3,
            fragment: "$".into(),
        };
        let connective = QueryError::InvalidConnective {
            offset: 9,
            found: "xor".into(),
        };
        assert!(tokenize.lenient_outcome());
        assert!(!connective.lenient_outcome());
    }

    #[test]
    fn messages() {
        let err = QueryError::InvalidConnective {
            offset: 9,
            found: "xor".into(),
        };
        assert_eq!(
            err.to_string(),
            "expected 'and' or 'or' at offset 9, found \"xor\""
        );
    }
}
