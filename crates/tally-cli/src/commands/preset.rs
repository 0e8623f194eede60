use std::io::Write;

use anyhow::{bail, Result};
use tally_analysis::{AnalysisError, FilterConfig, Record};
use tracing::info;

use super::Context;
use crate::cli::PresetAction;
use crate::output::{as_record, write_record, write_records};

pub fn run(ctx: &Context, action: PresetAction, out: &mut dyn Write) -> Result<()> {
    let mut presets = ctx.open_presets()?;

    match action {
        PresetAction::List => {
            let selected = presets.selected();
            let rows: Vec<Record> = presets
                .configs()
                .iter()
                .map(|config| -> Result<Record> {
                    let mut record = config_record(config)?;
                    let is_selected = selected == Some(config.name.as_str());
                    record.insert("selected".to_string(), is_selected.into());
                    Ok(record)
                })
                .collect::<Result<_>>()?;
            write_records(out, &rows, ctx.format)
        }

        PresetAction::Save {
            name,
            search,
            query,
            dates,
        } => {
            let range = dates.range()?;
            let saved = presets.save(&name, &search, &query, range)?;
            info!(name = %saved.name, "saved preset");
            write_record(out, config_record(saved)?, ctx.format)
        }

        PresetAction::Show { name } => {
            let config = presets.load(&name)?;
            write_record(out, config_record(&config)?, ctx.format)
        }

        PresetAction::Delete { name } => {
            if !presets.delete(&name)? {
                bail!(AnalysisError::UnknownPreset(name));
            }
            info!(name = %name, "deleted preset");
            Ok(())
        }
    }
}

fn config_record(config: &FilterConfig) -> Result<Record> {
    Ok(as_record(serde_json::to_value(config)?))
}
