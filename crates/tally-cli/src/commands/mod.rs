//! Command handlers. Each writes its result to `out` in the chosen format.

mod analyze;
mod preset;

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use tally_analysis::{JsonFileStore, PresetStore};

use crate::cli::{Cli, Commands, OutputFormat};

/// Settings every handler needs.
pub struct Context {
    pub data_dir: PathBuf,
    pub presets: PathBuf,
    pub format: OutputFormat,
}

impl Context {
    pub fn open_presets(&self) -> Result<PresetStore<JsonFileStore>> {
        Ok(PresetStore::open(JsonFileStore::new(&self.presets))?)
    }
}

/// Dispatches a parsed [`Cli`] to its handler.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let ctx = Context {
        data_dir: cli.data_dir,
        presets: cli.presets,
        format: cli.output,
    };

    match cli.command {
        Commands::Filter {
            dataset,
            filters,
            limit,
        } => analyze::filter(&ctx, &dataset, &filters, limit, out),

        Commands::Group {
            dataset,
            by,
            agg,
            measure,
            filters,
        } => analyze::group(&ctx, &dataset, &by, agg, &measure, &filters, out),

        Commands::Pivot {
            dataset,
            rows,
            columns,
            value,
            filters,
        } => analyze::pivot(&ctx, &dataset, &rows, columns.as_deref(), &value, &filters, out),

        Commands::Summary { dataset, filters } => analyze::summary(&ctx, &dataset, &filters, out),

        Commands::Fields { dataset } => analyze::fields(&ctx, &dataset, out),

        Commands::Check { query } => analyze::check(&ctx, &query, out),

        Commands::Preset { action } => preset::run(&ctx, action, out),
    }
}
