//! Tally analysis - filtering and aggregation over analytics records.
//!
//! This crate sits on top of [`tally_query`] and provides the dashboard
//! pipeline: narrow a record collection with [`apply_common_filters`], then
//! summarize it with [`group_data`] or [`create_pivot_table`].
//!
//! # Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tally_analysis::{
//!     apply_common_filters, group_data, stringify_fields, Aggregation, FilterOptions,
//!     RAW_EVENT_SEARCH_FIELDS,
//! };
//!
//! let events = vec![
//!     json!({"id": "e1", "country": "US", "platform": "ios", "duration_ms": 120}),
//!     json!({"id": "e2", "country": "US", "platform": "web", "duration_ms": 80}),
//!     json!({"id": "e3", "country": "KE", "platform": "ios", "duration_ms": 300}),
//! ];
//!
//! let options = FilterOptions::new().query("duration_ms > 100");
//! let slow = apply_common_filters(&events, &options, |e| {
//!     stringify_fields(e, RAW_EVENT_SEARCH_FIELDS)
//! });
//!
//! let by_platform = group_data(&slow, "platform", Aggregation::Avg, "duration_ms");
//! assert_eq!(by_platform.len(), 1);
//! assert_eq!(by_platform[0].dimension, "ios");
//! assert_eq!(by_platform[0].value, 210.0);
//! ```
//!
//! # Modules
//!
//! - filters: search text, query, facets and date range, ANDed
//! - grouping: `count`, `sum`, `avg`, `min`, `max` per dimension value
//! - pivots: count or sum per (row, column) pair with row totals
//! - summary: event and user totals, mean duration
//! - presets: named filter settings in a key-value store
//! - datasets and export: JSON in, JSON or CSV out

mod dataset;
mod dates;
mod dimension;
mod error;
mod export;
mod filter;
mod group;
mod pivot;
mod presets;
mod summary;

// Re-export public API
pub use dataset::{load_records, load_records_or_empty, DAILY_ROLLUPS_FILE, RAW_EVENTS_FILE};
pub use dates::{parse_day, DateRange, DAY_FIELD};
pub use dimension::{
    dimension_key, discover_dimensions, discover_measures, facet_options, pretty_label,
    DEFAULT_DIMENSIONS, FALLBACK_MEASURE, KNOWN_MEASURES, TOTAL, UNKNOWN,
};
pub use error::{AnalysisError, Result};
pub use export::{number_value, to_csv, to_json};
pub use filter::{
    apply_common_filters, apply_common_filters_cloned, stringify_fields, stringify_primitives,
    FacetMap, FilterOptions, RowFilter, DAILY_ROLLUP_SEARCH_FIELDS, DEFAULT_FACETS,
    RAW_EVENT_SEARCH_FIELDS,
};
pub use group::{group_data, round2, Aggregation, GroupRow};
pub use pivot::{
    create_pivot_table, ColumnKind, PivotColumn, PivotConfig, PivotRow, PivotTable, ValueMeasure,
};
pub use presets::{
    FilterConfig, JsonFileStore, KeyValueStore, MemoryStore, PresetStore, RecentState,
    CONFIGS_KEY, RECENT_KEY,
};
pub use summary::{summarize, Summary};

// The record types most callers need alongside the pipeline.
pub use tally_query::{Fields, Record, Value};
