//! Field access for queryable records.
//!
//! [`Fields`] is the seam between the query engine and the data it filters.
//! Untyped JSON records get an implementation out of the box; typed structs
//! can implement it by hand.

use serde_json::{Map, Value as Json};

use crate::value::Value;

/// An untyped record as loaded from the dashboard datasets.
pub type Record = Map<String, Json>;

/// Trait for types that can be queried by field name.
///
/// # Manual Implementation
///
/// ```
/// use tally_query::{Fields, Value};
///
/// struct Event {
///     country: String,
///     events_count: u32,
///     carrier: Option<String>,
/// }
///
/// impl Fields for Event {
///     fn field(&self, name: &str) -> Value<'_> {
///         match name {
///             "country" => Value::String(&self.country),
///             "events_count" => Value::from(self.events_count),
///             "carrier" => Value::from(self.carrier.as_deref()),
///             _ => Value::Missing,
///         }
///     }
/// }
///
/// let event = Event { country: "KE".into(), events_count: 3, carrier: None };
/// assert_eq!(event.field("country"), Value::String("KE"));
/// assert_eq!(event.field("carrier"), Value::Null);
/// ```
pub trait Fields {
    /// Returns the value of a top-level field, or [`Value::Missing`] when the
    /// record has no such key.
    fn field(&self, name: &str) -> Value<'_>;
}

impl<T: Fields + ?Sized> Fields for &T {
    fn field(&self, name: &str) -> Value<'_> {
        (**self).field(name)
    }
}

impl Fields for Map<String, Json> {
    fn field(&self, name: &str) -> Value<'_> {
        self.get(name).map(Value::from).unwrap_or(Value::Missing)
    }
}

impl Fields for Json {
    fn field(&self, name: &str) -> Value<'_> {
        match self {
            Json::Object(map) => map.field(name),
            Json::Array(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .map(Value::from)
                .unwrap_or(Value::Missing),
            _ => Value::Missing,
        }
    }
}

impl<'a> From<&'a Json> for Value<'a> {
    fn from(json: &'a Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.iter().map(Value::from).collect()),
            Json::Object(map) => Value::Record(map),
        }
    }
}

/// Resolves a dot-separated path such as `nested.value` against a record.
///
/// Each segment descends one level. Lists are indexed by numeric segments.
/// Descending through a null or missing value yields [`Value::Missing`], as
/// does descending into any other primitive.
pub fn resolve_path<'a, R>(record: &'a R, path: &str) -> Value<'a>
where
    R: Fields + ?Sized,
{
    let mut segments = path.split('.');
    let first = segments.next().unwrap_or_default();
    let mut current = record.field(first);

    for segment in segments {
        current = match current {
            Value::Record(inner) => inner.field(segment),
            Value::List(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|i| items.into_iter().nth(i))
                .unwrap_or(Value::Missing),
            _ => return Value::Missing,
        };
    }
    current
}
