use std::io::Write;

use anyhow::{Context as _, Result};
use serde_json::json;
use tally_analysis::{
    apply_common_filters, create_pivot_table, discover_dimensions, discover_measures,
    facet_options, group_data, load_records, pretty_label, stringify_fields, stringify_primitives,
    summarize, Aggregation, FilterOptions, PivotConfig, Record, ValueMeasure,
    DAILY_ROLLUP_SEARCH_FIELDS, DEFAULT_FACETS, RAW_EVENT_SEARCH_FIELDS,
};
use tally_query::Query;
use tracing::info;

use super::Context;
use crate::cli::{Dataset, FilterArgs};
use crate::output::{as_record, write_record, write_records};

struct Loaded {
    dataset: Dataset,
    records: Vec<Record>,
}

impl Loaded {
    fn open(ctx: &Context, name: &str) -> Result<Loaded> {
        let dataset = Dataset::resolve(name, &ctx.data_dir);
        let records = load_records(dataset.path())
            .with_context(|| format!("cannot load dataset '{name}'"))?;
        Ok(Loaded { dataset, records })
    }

    /// Text searched by `--search`: the explorer fields for the two dashboard
    /// datasets, every primitive field of any other file.
    fn haystack(&self, record: &Record) -> String {
        match self.dataset {
            Dataset::RawEvents(_) => stringify_fields(record, RAW_EVENT_SEARCH_FIELDS),
            Dataset::DailyRollups(_) => stringify_fields(record, DAILY_ROLLUP_SEARCH_FIELDS),
            Dataset::File(_) => stringify_primitives(record),
        }
    }

    fn filtered(&self, options: &FilterOptions) -> Vec<&Record> {
        apply_common_filters(&self.records, options, |r| self.haystack(r))
    }
}

fn resolve_options(ctx: &Context, filters: &FilterArgs) -> Result<FilterOptions> {
    let preset = match &filters.preset {
        Some(name) => Some(ctx.open_presets()?.load(name)?),
        None => None,
    };
    filters.to_options(preset.as_ref())
}

pub fn filter(
    ctx: &Context,
    dataset: &str,
    filters: &FilterArgs,
    limit: Option<usize>,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = Loaded::open(ctx, dataset)?;
    let options = resolve_options(ctx, filters)?;
    let hits = loaded.filtered(&options);
    info!(matched = hits.len(), total = loaded.records.len(), "filtered dataset");

    let rows: Vec<Record> = hits
        .into_iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    write_records(out, &rows, ctx.format)
}

pub fn group(
    ctx: &Context,
    dataset: &str,
    by: &str,
    aggregation: Aggregation,
    measure: &str,
    filters: &FilterArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = Loaded::open(ctx, dataset)?;
    let options = resolve_options(ctx, filters)?;
    let hits = loaded.filtered(&options);

    let rows: Vec<Record> = group_data(&hits, by, aggregation, measure)
        .iter()
        .map(|g| g.to_record(by))
        .collect();
    write_records(out, &rows, ctx.format)
}

pub fn pivot(
    ctx: &Context,
    dataset: &str,
    rows: &str,
    columns: Option<&str>,
    value: &str,
    filters: &FilterArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = Loaded::open(ctx, dataset)?;
    let options = resolve_options(ctx, filters)?;
    let hits = loaded.filtered(&options);

    let mut config = PivotConfig::new(rows).value(ValueMeasure::parse(value));
    if let Some(columns) = columns {
        config = config.columns(columns);
    }
    let table = create_pivot_table(&hits, &config);
    write_records(out, &table.to_records(), ctx.format)
}

pub fn summary(
    ctx: &Context,
    dataset: &str,
    filters: &FilterArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let loaded = Loaded::open(ctx, dataset)?;
    let options = resolve_options(ctx, filters)?;
    let hits = loaded.filtered(&options);
    write_record(out, summarize(&hits).to_record(), ctx.format)
}

pub fn fields(ctx: &Context, dataset: &str, out: &mut dyn Write) -> Result<()> {
    let loaded = Loaded::open(ctx, dataset)?;
    let records = &loaded.records;

    let mut rows: Vec<Record> = Vec::new();
    for name in discover_dimensions(records) {
        let label = pretty_label(&name);
        rows.push(as_record(json!({"kind": "dimension", "name": name, "label": label})));
    }
    for name in discover_measures(records) {
        let label = pretty_label(&name);
        rows.push(as_record(json!({"kind": "measure", "name": name, "label": label})));
    }
    for field in DEFAULT_FACETS {
        let values = facet_options(records, field);
        if values.is_empty() {
            continue;
        }
        rows.push(as_record(json!({
            "kind": "facet",
            "name": field,
            "label": pretty_label(field),
            "values": values,
        })));
    }
    write_records(out, &rows, ctx.format)
}

pub fn check(ctx: &Context, text: &str, out: &mut dyn Write) -> Result<()> {
    let query = Query::parse(text).with_context(|| format!("invalid query: {text}"))?;
    let record = as_record(json!({
        "query": query.to_string(),
        "terms": query.len(),
    }));
    write_record(out, record, ctx.format)
}
