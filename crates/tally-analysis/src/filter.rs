//! Common row filtering: free-text search, query, facets and date range.
//!
//! All predicates are ANDed. An unset predicate passes every row, so
//! [`FilterOptions::default`] keeps the input unchanged.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tally_analysis::{apply_common_filters, stringify_fields, FilterOptions};
//!
//! let rows = vec![
//!     json!({"id": "e1", "country": "US", "events_count": 150}),
//!     json!({"id": "e2", "country": "KE", "events_count": 20}),
//! ];
//! let options = FilterOptions::new()
//!     .query("events_count > 100")
//!     .facet("country", "US");
//!
//! let hits = apply_common_filters(&rows, &options, |r| stringify_fields(r, &["id"]));
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0]["id"], "e1");
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_query::{Fields, Matcher, Record, Value};
use tracing::debug;

use crate::dates::DateRange;

/// Facet selections: field name to required value. `None` and `""` leave the
/// field unconstrained.
pub type FacetMap = BTreeMap<String, Option<String>>;

/// Fields that make up the search haystack of a raw event.
pub const RAW_EVENT_SEARCH_FIELDS: &[&str] = &[
    "id",
    "event_name",
    "platform",
    "country",
    "app_id",
    "source",
    "release_channel",
];

/// Fields that make up the search haystack of a daily rollup.
pub const DAILY_ROLLUP_SEARCH_FIELDS: &[&str] = &[
    "day",
    "source",
    "platform",
    "country",
    "app_id",
    "event_group",
];

/// Facets the dashboard exposes.
pub const DEFAULT_FACETS: &[&str] = &["source", "platform", "country", "release_channel"];

/// Filter criteria shared by every view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    pub search_text: String,
    pub query: String,
    pub facets: FacetMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl FilterOptions {
    pub fn new() -> Self {
        FilterOptions::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search_text = text.into();
        self
    }

    pub fn query(mut self, text: impl Into<String>) -> Self {
        self.query = text.into();
        self
    }

    pub fn facet(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.facets.insert(field.into(), Some(value.into()));
        self
    }

    pub fn date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Returns `true` when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.search_text.trim().is_empty()
            && self.query.trim().is_empty()
            && self.active_facets().next().is_none()
            && self.date_range.is_none()
    }

    /// Facets that actually constrain rows.
    pub fn active_facets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facets.iter().filter_map(|(field, value)| match value {
            Some(v) if !v.is_empty() => Some((field.as_str(), v.as_str())),
            _ => None,
        })
    }

    /// Prepares the options for repeated row tests. The query is parsed here,
    /// once.
    pub fn compile(&self) -> RowFilter {
        let needle = self.search_text.trim();
        RowFilter {
            needle: (!needle.is_empty()).then(|| needle.to_lowercase()),
            matcher: Matcher::compile(&self.query),
            facets: self
                .active_facets()
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect(),
            date_range: self.date_range,
        }
    }
}

/// Compiled form of [`FilterOptions`].
#[derive(Debug, Clone)]
pub struct RowFilter {
    needle: Option<String>,
    matcher: Matcher,
    facets: Vec<(String, String)>,
    date_range: Option<DateRange>,
}

impl RowFilter {
    /// Tests one row. `stringify` builds the search haystack and only runs
    /// when search text is set.
    pub fn matches<T, S>(&self, row: &T, stringify: S) -> bool
    where
        T: Fields + ?Sized,
        S: FnOnce(&T) -> String,
    {
        if let Some(needle) = &self.needle {
            if !stringify(row).to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }

        if !self.matcher.matches(row) {
            return false;
        }

        let facets_hold = self
            .facets
            .iter()
            .all(|(field, want)| matches!(row.field(field), Value::String(s) if s == want.as_str()));
        if !facets_hold {
            return false;
        }

        self.date_range
            .as_ref()
            .map_or(true, |range| range.contains_record(row))
    }
}

/// Filters rows by search text, query, facets and date range, keeping input
/// order.
pub fn apply_common_filters<'a, T, S>(
    records: &'a [T],
    options: &FilterOptions,
    stringify: S,
) -> Vec<&'a T>
where
    T: Fields,
    S: Fn(&T) -> String,
{
    let filter = options.compile();
    let kept: Vec<&T> = records
        .iter()
        .filter(|row| filter.matches(*row, &stringify))
        .collect();
    debug!(input = records.len(), kept = kept.len(), "applied common filters");
    kept
}

/// Like [`apply_common_filters`], returning owned copies.
pub fn apply_common_filters_cloned<T, S>(
    records: &[T],
    options: &FilterOptions,
    stringify: S,
) -> Vec<T>
where
    T: Fields + Clone,
    S: Fn(&T) -> String,
{
    apply_common_filters(records, options, stringify)
        .into_iter()
        .cloned()
        .collect()
}

/// Joins the text of the listed fields with spaces. Null and missing fields
/// contribute an empty string.
pub fn stringify_fields<R: Fields + ?Sized>(record: &R, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|name| {
            let value = record.field(name);
            if value.is_nullish() {
                String::new()
            } else {
                value.to_text()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Joins every top-level string, number and boolean of a record with spaces.
pub fn stringify_primitives(record: &Record) -> String {
    record
        .values()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(_) | serde_json::Value::Bool(_) => {
                Some(Value::from(v).to_text())
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    fn rows() -> Vec<Json> {
        vec![
            json!({"id": "e1", "country": "US", "platform": "ios", "n": 5, "day": "2025-03-01"}),
            json!({"id": "e2", "country": "KE", "platform": "android", "n": 50, "day": "2025-03-15"}),
            json!({"id": "e3", "country": "US", "platform": "web", "n": 500, "day": "2025-04-01"}),
        ]
    }

    fn ids(hits: &[&Json]) -> Vec<String> {
        hits.iter().map(|r| r["id"].as_str().unwrap().to_string()).collect()
    }

    fn by_id(r: &Json) -> String {
        stringify_fields(r, &["id", "country", "platform"])
    }

    #[test]
    fn empty_options_keep_everything() {
        let data = rows();
        let hits = apply_common_filters(&data, &FilterOptions::new(), by_id);
        assert_eq!(ids(&hits), vec!["e1", "e2", "e3"]);
        assert!(FilterOptions::new().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_and_trimmed() {
        let data = rows();
        let hits = apply_common_filters(&data, &FilterOptions::new().search("  ANDROID "), by_id);
        assert_eq!(ids(&hits), vec!["e2"]);

        let blank = apply_common_filters(&data, &FilterOptions::new().search("   "), by_id);
        assert_eq!(blank.len(), 3);
    }

    #[test]
    fn stringify_not_called_without_search() {
        let data = rows();
        let hits = apply_common_filters(&data, &FilterOptions::new().query("n > 10"), |_| {
            panic!("haystack built without search text")
        });
        assert_eq!(ids(&hits), vec!["e2", "e3"]);
    }

    #[test]
    fn bad_connective_filters_everything_out() {
        let data = rows();
        let hits = apply_common_filters(&data, &FilterOptions::new().query("n > 1 nor n < 9"), by_id);
        assert!(hits.is_empty());
    }

    #[test]
    fn untokenizable_query_keeps_everything() {
        let data = rows();
        let hits = apply_common_filters(&data, &FilterOptions::new().query("n > 1 !!"), by_id);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn facets_require_exact_string() {
        let data = vec![
            json!({"id": "a", "country": "US"}),
            json!({"id": "b", "country": "us"}),
            json!({"id": "c"}),
            json!({"id": "d", "country": 1}),
        ];
        let hits = apply_common_filters(&data, &FilterOptions::new().facet("country", "US"), by_id);
        assert_eq!(ids(&hits), vec!["a"]);

        let num = apply_common_filters(&data, &FilterOptions::new().facet("country", "1"), by_id);
        assert!(num.is_empty());
    }

    #[test]
    fn unset_facets_do_not_constrain() {
        let data = rows();
        let mut options = FilterOptions::new();
        options.facets.insert("country".into(), None);
        options.facets.insert("platform".into(), Some(String::new()));
        assert!(options.is_empty());
        assert_eq!(apply_common_filters(&data, &options, by_id).len(), 3);
    }

    #[test]
    fn date_range_on_day_field() {
        let data = rows();
        let march = DateRange::parse_days("2025-03-01", "2025-03-31").unwrap();
        let hits = apply_common_filters(&data, &FilterOptions::new().date_range(march), by_id);
        assert_eq!(ids(&hits), vec!["e1", "e2"]);
    }

    #[test]
    fn predicates_combine() {
        let data = rows();
        let options = FilterOptions::new()
            .search("us")
            .query("n >= 5")
            .facet("platform", "web");
        let hits = apply_common_filters(&data, &options, by_id);
        assert_eq!(ids(&hits), vec!["e3"]);
    }

    #[test]
    fn cloned_variant() {
        let data = rows();
        let owned = apply_common_filters_cloned(&data, &FilterOptions::new().query("n == 50"), by_id);
        assert_eq!(owned, vec![data[1].clone()]);
    }

    #[test]
    fn stringify_helpers() {
        let r = json!({"id": "e1", "country": null, "n": 7, "ok": true, "tags": ["x"]});
        assert_eq!(stringify_fields(&r, &["id", "country", "missing", "n"]), "e1   7");
        let map: Record = serde_json::from_value(r).unwrap();
        assert_eq!(stringify_primitives(&map), "e1 7 true");
    }

    #[test]
    fn daily_rollup_haystack_skips_measures() {
        let rollups = vec![json!({
            "day": "2025-03-01", "source": "mobile", "platform": "ios", "country": "US",
            "app_id": "com.acme.shop", "event_group": "analytics:login",
            "release_channel": "beta", "events_count": 777
        })];
        let hay = |r: &Json| stringify_fields(r, DAILY_ROLLUP_SEARCH_FIELDS);
        let hits = |text: &str| {
            apply_common_filters(&rollups, &FilterOptions::new().search(text), hay).len()
        };

        assert_eq!(hits("777"), 0);
        assert_eq!(hits("beta"), 0);
        assert_eq!(hits("analytics:LOGIN"), 1);
        assert_eq!(hits("2025-03-01 mobile"), 1);
    }

    #[test]
    fn options_serde_camel_case() {
        let options = FilterOptions::new().search("x").query("n > 1");
        let v = serde_json::to_value(&options).unwrap();
        assert_eq!(v["searchText"], "x");
        assert!(v.get("dateRange").is_none());
        let back: FilterOptions = serde_json::from_value(v).unwrap();
        assert_eq!(back, options);
    }
}
