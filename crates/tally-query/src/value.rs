//! Runtime values read out of records.
//!
//! The [`Value`] enum is what a [`Fields`] accessor hands back for a field. It
//! mirrors the loose value model of the dashboard datasets: strings, numbers,
//! booleans, null, missing keys, lists and nested records. Coercions follow the
//! conventions the datasets were produced under, so `"150"` compares equal to
//! `150` and `null` renders as `"null"`.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::fields::Fields;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("decimal pattern is valid")
});

/// Runtime value for comparison, borrowed from the source record.
///
/// # Example
///
/// ```
/// use tally_query::Value;
///
/// assert_eq!(Value::from("150").as_number(), Some(150.0));
/// assert_eq!(Value::Null.to_text(), "null");
/// assert_eq!(Value::Missing.to_text(), "undefined");
/// ```
#[derive(Clone)]
pub enum Value<'a> {
    /// Key not present, or a path that ran through a null.
    Missing,
    /// Explicit null.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value. Every number is a double, as in the source data.
    Number(f64),
    /// String value (borrowed).
    String(&'a str),
    /// Ordered list of values.
    List(Vec<Value<'a>>),
    /// Nested record, reachable through dot paths.
    Record(&'a dyn Fields),
}

impl<'a> Value<'a> {
    /// Returns `true` if the key was absent.
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Returns `true` for null or missing values.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Missing | Value::Null)
    }

    /// Extracts the string value, if present.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Value::String(s) => Some(*s),
            _ => None,
        }
    }

    /// Extracts the boolean value, if present.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Extracts the nested record, if present.
    pub fn as_record(&self) -> Option<&'a dyn Fields> {
        match self {
            Value::Record(r) => Some(*r),
            _ => None,
        }
    }

    /// Returns the value as a number when it already is one, or when it is a
    /// non-blank string that converts cleanly.
    ///
    /// Booleans, null and missing values are not numbers here, so they fall
    /// back to text comparison under `==`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::String(s) if !s.trim().is_empty() => {
                let n = string_to_number(s);
                (!n.is_nan()).then_some(n)
            }
            _ => None,
        }
    }

    /// Full numeric conversion: booleans become 0/1, null becomes 0, blank
    /// strings become 0, anything unconvertible becomes NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Missing | Value::Record(_) => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s),
            Value::List(_) => string_to_number(&self.to_text()),
        }
    }

    /// Numeric conversion used by aggregations: NaN collapses to 0.
    pub fn number_or_zero(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Renders the value as text.
    pub fn to_text(&self) -> String {
        match self {
            Value::Missing => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => (*s).to_string(),
            Value::List(items) => items
                .iter()
                .map(|item| {
                    if item.is_nullish() {
                        String::new()
                    } else {
                        item.to_text()
                    }
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Record(_) => "[object Object]".to_string(),
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => f.write_str("Missing"),
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Record(_) => f.write_str("Record(..)"),
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Missing, Value::Missing) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => std::ptr::addr_eq(*a, *b),
            _ => false,
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value<'_> {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value<'_> {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u64> for Value<'_> {
    fn from(n: u64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value<'_> {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value<'_> {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl<'a, T> From<Option<T>> for Value<'a>
where
    T: Into<Value<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Converts text to a number the way the dashboard's data layer does.
///
/// Surrounding whitespace is ignored and blank text is 0. Decimal literals
/// (with optional sign, fraction and exponent), `0x`/`0o`/`0b` integers and
/// `Infinity` are accepted; anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix(&s[2..], radix);
    }

    if DECIMAL.is_match(s) {
        s.parse::<f64>().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    digits
        .chars()
        .try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix)
                .map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

/// Formats a number the way it prints in the source datasets: integral values
/// without a fraction, `NaN` and `Infinity` spelled out.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i128)
    } else {
        format!("{}", n)
    }
}
