use std::io::Write;

use anyhow::Result;
use tally_analysis::{to_csv, to_json, Record};

use crate::cli::OutputFormat;

/// Writes records in the requested format.
pub fn write_records(out: &mut dyn Write, records: &[Record], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", to_json(records)?)?,
        OutputFormat::Csv => out.write_all(to_csv(records)?.as_bytes())?,
    }
    Ok(())
}

/// Writes a single record: pretty JSON, or a one-row CSV.
pub fn write_record(out: &mut dyn Write, record: Record, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", to_json(&record)?)?;
            Ok(())
        }
        OutputFormat::Csv => write_records(out, &[record], format),
    }
}

/// Converts any JSON object into a record, wrapping other values under
/// `value`.
pub fn as_record(value: serde_json::Value) -> Record {
    match value {
        serde_json::Value::Object(map) => map,
        other => {
            let mut record = Record::new();
            record.insert("value".to_string(), other);
            record
        }
    }
}
