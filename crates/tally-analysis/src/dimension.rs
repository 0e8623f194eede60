//! Dimension keys and option discovery.
//!
//! A dimension is a field records are bucketed by. Missing values bucket
//! under [`UNKNOWN`]. The `event_name` dimension falls back to `event_group`,
//! which is what daily rollups carry in its place.

use std::collections::BTreeSet;

use tally_query::{Fields, Record, Value};

/// Bucket key for records without a value for the dimension.
pub const UNKNOWN: &str = "Unknown";

/// Column key used when no column dimension is configured, and the header of
/// the synthesized row-total column.
pub const TOTAL: &str = "Total";

const EVENT_NAME: &str = "event_name";
const EVENT_GROUP: &str = "event_group";

/// Dimensions offered first, in this order, when present.
pub const DEFAULT_DIMENSIONS: &[&str] = &[
    "day",
    "source",
    "platform",
    "app_id",
    "app_version",
    "release_channel",
    "country",
    "device_tier",
    "event_group",
];

/// Numeric measures recognized in daily rollups.
pub const KNOWN_MEASURES: &[&str] = &[
    "events_count",
    "users_count",
    "sessions_count",
    "avg_duration_ms",
    "p50_duration_ms",
    "p90_duration_ms",
    "p99_duration_ms",
    "http_error_rate",
    "crash_rate_per_1k_sessions",
    "revenue_usd",
    "purchase_count",
];

/// Measure offered when a dataset has none of the known ones.
pub const FALLBACK_MEASURE: &str = "events_count";

/// Resolves the bucket key of a record for a dimension.
pub fn dimension_key<R: Fields + ?Sized>(record: &R, dimension: &str) -> String {
    let mut value = record.field(dimension);
    if dimension == EVENT_NAME && value.is_nullish() {
        value = record.field(EVENT_GROUP);
    }
    if value.is_nullish() {
        UNKNOWN.to_string()
    } else {
        value.to_text()
    }
}

/// Lists the dimensions worth offering for a dataset, judged by its first
/// record.
///
/// Default dimensions come first, then any other string field. When records
/// carry `event_group` but no `event_name`, `event_name` is appended as an
/// alias.
pub fn discover_dimensions(records: &[Record]) -> Vec<String> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let mut dims: Vec<String> = DEFAULT_DIMENSIONS
        .iter()
        .filter(|d| first.contains_key(**d))
        .map(|d| d.to_string())
        .collect();

    dims.extend(
        first
            .iter()
            .filter(|(k, v)| v.is_string() && !DEFAULT_DIMENSIONS.contains(&k.as_str()))
            .map(|(k, _)| k.clone()),
    );

    if !first.contains_key(EVENT_NAME) && first.contains_key(EVENT_GROUP) {
        dims.push(EVENT_NAME.to_string());
    }
    dims
}

/// Lists the known numeric measures present on the first record, or the
/// fallback measure when there are none.
pub fn discover_measures(records: &[Record]) -> Vec<String> {
    let found: Vec<String> = records
        .first()
        .map(|first| {
            KNOWN_MEASURES
                .iter()
                .filter(|m| first.contains_key(**m))
                .map(|m| m.to_string())
                .collect()
        })
        .unwrap_or_default();

    if found.is_empty() {
        vec![FALLBACK_MEASURE.to_string()]
    } else {
        found
    }
}

/// Distinct, non-empty string values of a field, sorted. Feeds facet pickers.
pub fn facet_options<R: Fields>(records: &[R], field: &str) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| match r.field(field) {
            Value::String(s) if !s.is_empty() => Some(s.to_string()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Turns `snake_case` into a `Title Case` label.
pub fn pretty_label(key: &str) -> String {
    if key == EVENT_NAME {
        return "Event Type".to_string();
    }
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => c.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    fn records(v: Json) -> Vec<Record> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn dimension_key_rendering() {
        let r = json!({"country": "KE", "hour": 7, "flag": true, "gone": null});
        assert_eq!(dimension_key(&r, "country"), "KE");
        assert_eq!(dimension_key(&r, "hour"), "7");
        assert_eq!(dimension_key(&r, "flag"), "true");
        assert_eq!(dimension_key(&r, "gone"), UNKNOWN);
        assert_eq!(dimension_key(&r, "absent"), UNKNOWN);
    }

    #[test]
    fn event_name_falls_back_to_event_group() {
        let rollup = json!({"event_group": "crash:fatal"});
        assert_eq!(dimension_key(&rollup, "event_name"), "crash:fatal");

        let raw = json!({"event_name": "login", "event_group": "analytics:login"});
        assert_eq!(dimension_key(&raw, "event_name"), "login");

        assert_eq!(dimension_key(&json!({}), "event_name"), UNKNOWN);
    }

    #[test]
    fn dimensions_from_first_record() {
        let rows = records(json!([{
            "day": "2025-01-01",
            "platform": "ios",
            "event_group": "performance:api_call",
            "region": "east",
            "events_count": 3
        }]));
        assert_eq!(
            discover_dimensions(&rows),
            vec!["day", "platform", "event_group", "region", "event_name"]
        );
        assert!(discover_dimensions(&[]).is_empty());
    }

    #[test]
    fn measures_from_first_record() {
        let rows = records(json!([{"users_count": 1, "events_count": 2, "x": 3}]));
        assert_eq!(discover_measures(&rows), vec!["events_count", "users_count"]);
        let bare = records(json!([{"x": 1}]));
        assert_eq!(discover_measures(&bare), vec![FALLBACK_MEASURE]);
    }

    #[test]
    fn facet_options_are_distinct_and_sorted() {
        let rows = vec![
            json!({"country": "UG"}),
            json!({"country": "KE"}),
            json!({"country": "UG"}),
            json!({"country": ""}),
            json!({"country": null}),
            json!({}),
        ];
        assert_eq!(facet_options(&rows, "country"), vec!["KE", "UG"]);
    }

    #[test]
    fn labels() {
        assert_eq!(pretty_label("release_channel"), "Release Channel");
        assert_eq!(pretty_label("event_name"), "Event Type");
        assert_eq!(pretty_label("day"), "Day");
    }
}
