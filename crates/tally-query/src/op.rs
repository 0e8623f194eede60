//! Comparison operators for query conditions.

use std::cmp::Ordering;

/// Comparison operator for a query condition.
///
/// `Eq` and `Ne` compare numerically when both sides are numbers and fall back
/// to text otherwise. The ordering operators are always numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl Op {
    /// Parses an operator token. Returns `None` for anything else.
    pub fn parse(token: &str) -> Option<Op> {
        match token {
            "==" => Some(Op::Eq),
            "!=" => Some(Op::Ne),
            ">" => Some(Op::Gt),
            ">=" => Some(Op::Gte),
            "<" => Some(Op::Lt),
            "<=" => Some(Op::Lte),
            _ => None,
        }
    }

    /// Returns `true` for the four ordering operators.
    pub fn is_ordering(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// Evaluates the operator against the result of a numeric comparison.
    ///
    /// `None` stands for an unordered pair (a NaN on either side): only `Ne`
    /// holds for it.
    pub fn eval_ordering(self, ordering: Option<Ordering>) -> bool {
        match (self, ordering) {
            (Op::Ne, None) => true,
            (_, None) => false,
            (Op::Eq, Some(o)) => o == Ordering::Equal,
            (Op::Ne, Some(o)) => o != Ordering::Equal,
            (Op::Gt, Some(o)) => o == Ordering::Greater,
            (Op::Gte, Some(o)) => o != Ordering::Less,
            (Op::Lt, Some(o)) => o == Ordering::Less,
            (Op::Lte, Some(o)) => o != Ordering::Greater,
        }
    }

    /// Returns the query-language spelling of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
