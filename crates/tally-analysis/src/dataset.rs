//! Loading record collections from JSON files.

use std::fs;
use std::path::Path;

use serde_json::Value as Json;
use tally_query::Record;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};

/// File name of the raw event dataset.
pub const RAW_EVENTS_FILE: &str = "raw_events.json";
/// File name of the daily rollup dataset.
pub const DAILY_ROLLUPS_FILE: &str = "daily_rollups.json";

/// Reads a JSON array of objects.
///
/// Elements that are not objects make the whole file invalid.
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = fs::read_to_string(path).map_err(|source| AnalysisError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let records = parse_records(&text).ok_or_else(|| AnalysisError::NotRecords {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), records = records.len(), "loaded dataset");
    Ok(records)
}

/// Like [`load_records`], logging any failure and returning no records.
pub fn load_records_or_empty(path: &Path) -> Vec<Record> {
    load_records(path).unwrap_or_else(|err| {
        warn!(error = %err, "dataset unavailable, continuing with no records");
        Vec::new()
    })
}

fn parse_records(text: &str) -> Option<Vec<Record>> {
    match serde_json::from_str::<Json>(text).ok()? {
        Json::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Json::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_array_of_objects() {
        let file = file_with(r#"[{"id": "e1", "n": 1}, {"id": "e2"}]"#);
        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["id"], "e1");
    }

    #[test]
    fn rejects_non_record_arrays() {
        let file = file_with("[1, 2, 3]");
        assert!(matches!(
            load_records(file.path()),
            Err(AnalysisError::NotRecords { .. })
        ));

        let file = file_with(r#"{"id": "e1"}"#);
        assert!(matches!(
            load_records(file.path()),
            Err(AnalysisError::NotRecords { .. })
        ));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RAW_EVENTS_FILE);
        assert!(matches!(
            load_records(&path),
            Err(AnalysisError::Read { .. })
        ));
        assert!(load_records_or_empty(&path).is_empty());
    }

    #[test]
    fn malformed_json_is_empty_when_lenient() {
        let file = file_with("[{\"id\": ");
        assert!(load_records_or_empty(file.path()).is_empty());
    }
}
