//! Tokenizer for the query language.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{QueryError, Result};

// Alternatives are tried in order: two-char operators before one-char ones,
// lowercase connectives before identifiers. A connective needs no word
// boundary, so `android` splits into `and` + `roid`. Digits are ASCII only.
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(>=|<=|==|!=|>|<|and|or|[A-Za-z_][A-Za-z0-9_.]*|'[^']*'|[0-9]+(?:\.[0-9]+)?)",
    )
    .expect("token pattern is valid")
});

/// Token category, derived from the token text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// One of `== != > >= < <=`.
    Operator,
    /// An identifier or bare word, including the connectives.
    Word,
    /// A single-quoted string, quotes included.
    Quoted,
    /// A bare number.
    Number,
}

/// A token borrowed from the query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'q> {
    pub kind: TokenKind,
    pub text: &'q str,
    /// Byte offset of the token in the query.
    pub offset: usize,
}

impl<'q> Token<'q> {
    fn new(text: &'q str, offset: usize) -> Self {
        let kind = match text.as_bytes().first() {
            Some(b'\'') => TokenKind::Quoted,
            Some(b) if b.is_ascii_digit() => TokenKind::Number,
            Some(b'=' | b'!' | b'<' | b'>') => TokenKind::Operator,
            _ => TokenKind::Word,
        };
        Token { kind, text, offset }
    }
}

/// Splits a query into tokens.
///
/// Fails with [`QueryError::Tokenize`] when anything other than whitespace is
/// left after the last recognizable token.
pub fn tokenize(query: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(caps) = TOKEN.captures(&query[pos..]) {
        let (Some(whole), Some(tok)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        tokens.push(Token::new(tok.as_str(), pos + tok.start()));
        pos += whole.end();
    }

    let rest = &query[pos..];
    if rest.trim().is_empty() {
        Ok(tokens)
    } else {
        let skipped = rest.len() - rest.trim_start().len();
        Err(QueryError::Tokenize {
            offset: pos + skipped,
            fragment: rest.trim().to_string(),
        })
    }
}
