//! End-to-end filtering and aggregation over dashboard-shaped datasets.

use serde_json::{json, Value as Json};
use tally_analysis::{
    apply_common_filters, create_pivot_table, discover_dimensions, discover_measures,
    facet_options, group_data, stringify_fields, stringify_primitives, to_csv, Aggregation,
    DateRange, FilterOptions, GroupRow, PivotConfig, Record, ValueMeasure,
    RAW_EVENT_SEARCH_FIELDS,
};

fn raw_events() -> Vec<Json> {
    vec![
        json!({
            "id": "evt-001", "event_name": "login", "platform": "ios", "country": "US",
            "app_id": "com.acme.shop", "source": "mobile", "release_channel": "stable",
            "duration_ms": 120, "day": "2025-03-01"
        }),
        json!({
            "id": "evt-002", "event_name": "purchase", "platform": "android", "country": "KE",
            "app_id": "com.acme.shop", "source": "mobile", "release_channel": "beta",
            "duration_ms": 340, "day": "2025-03-02"
        }),
        json!({
            "id": "evt-003", "event_name": "login", "platform": "web", "country": "US",
            "app_id": "com.acme.web", "source": "web", "release_channel": "stable",
            "duration_ms": "95", "day": "2025-03-15"
        }),
        json!({
            "id": "evt-004", "event_name": "crash", "platform": "ios", "country": "UG",
            "app_id": "com.acme.shop", "source": "mobile", "release_channel": null,
            "duration_ms": null, "day": "2025-04-02"
        }),
    ]
}

fn daily_rollups() -> Vec<Record> {
    serde_json::from_value(json!([
        {"day": "2025-03-01", "platform": "ios", "country": "US",
         "event_group": "analytics:login", "events_count": 120, "users_count": 40},
        {"day": "2025-03-01", "platform": "android", "country": "US",
         "event_group": "analytics:login", "events_count": 80, "users_count": 30},
        {"day": "2025-03-02", "platform": "ios", "country": "KE",
         "event_group": "crash:fatal", "events_count": 5, "users_count": 5},
    ]))
    .unwrap()
}

fn haystack(e: &Json) -> String {
    stringify_fields(e, RAW_EVENT_SEARCH_FIELDS)
}

fn ids<'a>(rows: &[&'a Json]) -> Vec<&'a str> {
    rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
}

#[test]
fn search_matches_any_listed_field() {
    let events = raw_events();
    let hits = apply_common_filters(&events, &FilterOptions::new().search("BETA"), haystack);
    assert_eq!(ids(&hits), vec!["evt-002"]);

    let hits = apply_common_filters(&events, &FilterOptions::new().search("acme.web"), haystack);
    assert_eq!(ids(&hits), vec!["evt-003"]);
}

#[test]
fn query_over_numeric_text() {
    let events = raw_events();
    let options = FilterOptions::new().query("duration_ms < 100 or event_name == 'crash'");
    let hits = apply_common_filters(&events, &options, haystack);
    assert_eq!(ids(&hits), vec!["evt-003", "evt-004"]);
}

#[test]
fn facets_and_dates_narrow_together() {
    let events = raw_events();
    let march = DateRange::parse_days("2025-03-01", "2025-03-31").unwrap();
    let options = FilterOptions::new()
        .facet("source", "mobile")
        .date_range(march);
    let hits = apply_common_filters(&events, &options, haystack);
    assert_eq!(ids(&hits), vec!["evt-001", "evt-002"]);
}

#[test]
fn filter_then_group() {
    let events = raw_events();
    let us = apply_common_filters(&events, &FilterOptions::new().facet("country", "US"), haystack);
    let groups = group_data(&us, "event_name", Aggregation::Sum, "duration_ms");
    assert_eq!(
        groups,
        vec![GroupRow {
            dimension: "login".into(),
            value: 215.0
        }]
    );
}

#[test]
fn group_rollups_by_event_name_alias() {
    let rollups = daily_rollups();
    let groups = group_data(&rollups, "event_name", Aggregation::Sum, "events_count");
    let pairs: Vec<_> = groups.iter().map(|g| (g.dimension.as_str(), g.value)).collect();
    assert_eq!(pairs, vec![("analytics:login", 200.0), ("crash:fatal", 5.0)]);
}

#[test]
fn pivot_rollups_to_csv() {
    let rollups = daily_rollups();
    let config = PivotConfig::new("day")
        .columns("platform")
        .value(ValueMeasure::parse("users_count"));
    let table = create_pivot_table(&rollups, &config);
    let csv = to_csv(&table.to_records()).unwrap();
    assert_eq!(csv, "day,ios,android,Total\n2025-03-01,40,30,70\n2025-03-02,5,0,5\n");
}

#[test]
fn group_rows_to_csv() {
    let rollups = daily_rollups();
    let groups = group_data(&rollups, "country", Aggregation::Avg, "events_count");
    let records: Vec<Record> = groups.iter().map(|g| g.to_record("country")).collect();
    assert_eq!(to_csv(&records).unwrap(), "country,value\nUS,100\nKE,5\n");
}

#[test]
fn discovery_on_rollups() {
    let rollups = daily_rollups();
    assert_eq!(
        discover_dimensions(&rollups),
        vec!["day", "platform", "country", "event_group", "event_name"]
    );
    assert_eq!(discover_measures(&rollups), vec!["events_count", "users_count"]);
    assert_eq!(facet_options(&rollups, "country"), vec!["KE", "US"]);
}

#[test]
fn rollup_search_over_primitives() {
    let rollups = daily_rollups();
    let options = FilterOptions::new().search("fatal");
    let hits = apply_common_filters(&rollups, &options, stringify_primitives);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["country"], "KE");
}
