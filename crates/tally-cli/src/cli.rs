use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tally_analysis::{
    parse_day, Aggregation, DateRange, FilterConfig, FilterOptions, DAILY_ROLLUPS_FILE,
    FALLBACK_MEASURE, RAW_EVENTS_FILE,
};

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    about = "Filter, group and pivot analytics datasets",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding raw_events.json and daily_rollups.json
    #[arg(long, global = true, env = "TALLY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// File holding saved filter presets
    #[arg(
        long,
        global = true,
        env = "TALLY_PRESETS",
        default_value = ".tally-presets.json"
    )]
    pub presets: PathBuf,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress log output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Csv,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the records that pass the filters
    Filter {
        /// `raw`, `daily`, or a path to a JSON array of records
        dataset: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print at most this many records
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Aggregate filtered records per dimension value
    Group {
        dataset: String,

        /// Dimension to group by
        #[arg(long)]
        by: String,

        /// count, sum, avg, min or max
        #[arg(long, default_value = "count")]
        agg: Aggregation,

        /// Numeric field to aggregate
        #[arg(long, default_value = FALLBACK_MEASURE)]
        measure: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Cross-tabulate filtered records
    Pivot {
        dataset: String,

        /// Row dimension
        #[arg(long)]
        rows: String,

        /// Column dimension; without it each row has a single Total
        #[arg(long)]
        columns: Option<String>,

        /// `count`, or a numeric field to sum
        #[arg(long, default_value = "count")]
        value: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Total events and users and the mean duration of filtered records
    Summary {
        dataset: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// List the dimensions, measures and facet values of a dataset
    Fields { dataset: String },

    /// Parse a query and print it in normalized form
    Check {
        /// Query text, e.g. "country == 'US' and events_count > 100"
        query: String,
    },

    /// Manage saved filter presets
    Preset {
        #[command(subcommand)]
        action: PresetAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum PresetAction {
    /// List saved presets
    List,

    /// Save (or replace) a preset
    Save {
        name: String,

        #[arg(long, default_value = "")]
        search: String,

        #[arg(long, default_value = "")]
        query: String,

        #[command(flatten)]
        dates: DateArgs,
    },

    /// Show a preset and select it
    Show { name: String },

    /// Delete a preset
    Delete { name: String },
}

/// Date range flags shared by filtering commands and `preset save`.
#[derive(Debug, Clone, Default, Args)]
pub struct DateArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day_arg, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = parse_day_arg, requires = "from")]
    pub to: Option<NaiveDate>,

    /// Restrict to the current calendar month
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub this_month: bool,
}

impl DateArgs {
    pub fn range(&self) -> anyhow::Result<Option<DateRange>> {
        if self.this_month {
            return Ok(Some(DateRange::month_of(Utc::now().date_naive())?));
        }
        match (self.from, self.to) {
            (Some(from), Some(to)) => Ok(Some(DateRange::from_days(from, to)?)),
            _ => Ok(None),
        }
    }
}

/// Filter flags shared by the analysis commands.
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Free-text search, case-insensitive
    #[arg(long)]
    pub search: Option<String>,

    /// Query, e.g. "platform == 'ios' and events_count > 10"
    #[arg(long)]
    pub query: Option<String>,

    /// Exact-match facet as FIELD=VALUE (repeatable)
    #[arg(long = "facet", value_parser = parse_facet)]
    pub facets: Vec<(String, String)>,

    #[command(flatten)]
    pub dates: DateArgs,

    /// Start from a saved preset; other flags override it
    #[arg(long)]
    pub preset: Option<String>,
}

impl FilterArgs {
    /// Layers the explicit flags over an optional preset.
    pub fn to_options(&self, preset: Option<&FilterConfig>) -> anyhow::Result<FilterOptions> {
        let mut options = preset.map(FilterConfig::to_options).unwrap_or_default();
        if let Some(search) = &self.search {
            options.search_text = search.clone();
        }
        if let Some(query) = &self.query {
            options.query = query.clone();
        }
        for (field, value) in &self.facets {
            let value = (!value.is_empty()).then(|| value.clone());
            options.facets.insert(field.clone(), value);
        }
        if let Some(range) = self.dates.range()? {
            options.date_range = Some(range);
        }
        Ok(options)
    }
}

/// Which dataset a command reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dataset {
    RawEvents(PathBuf),
    DailyRollups(PathBuf),
    File(PathBuf),
}

impl Dataset {
    pub fn resolve(name: &str, data_dir: &Path) -> Dataset {
        match name {
            "raw" => Dataset::RawEvents(data_dir.join(RAW_EVENTS_FILE)),
            "daily" => Dataset::DailyRollups(data_dir.join(DAILY_ROLLUPS_FILE)),
            other => Dataset::File(PathBuf::from(other)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Dataset::RawEvents(p) | Dataset::DailyRollups(p) | Dataset::File(p) => p,
        }
    }
}

fn parse_facet(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{s}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

fn parse_day_arg(s: &str) -> Result<NaiveDate, String> {
    parse_day(s).map_err(|e| e.to_string())
}
