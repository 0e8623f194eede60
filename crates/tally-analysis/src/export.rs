//! JSON and CSV rendering of record collections.
//!
//! Group rows and pivot tables flatten to [`Record`]s first (see
//! [`GroupRow::to_record`](crate::GroupRow::to_record) and
//! [`PivotTable::to_records`](crate::PivotTable::to_records)), so every
//! output goes through the same two writers.

use serde::Serialize;
use serde_json::Value as Json;
use tally_query::Record;

use crate::error::{AnalysisError, Result};

/// Converts an aggregate to JSON, writing integral values without a fraction.
pub fn number_value(n: f64) -> Json {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Json::from(n as i64)
    } else {
        Json::from(n)
    }
}

/// Serializes data to pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Writes records as CSV.
///
/// The header is the union of all keys in first-seen order. Missing cells and
/// nulls are empty; nested values are written as JSON.
pub fn to_csv(rows: &[Record]) -> Result<String> {
    let mut headers: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    if headers.is_empty() {
        return Ok(String::new());
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(&headers).map_err(csv_error)?;

    for row in rows {
        let cells: Vec<String> = headers
            .iter()
            .map(|h| row.get(*h).map(cell_text).unwrap_or_default())
            .collect();
        wtr.write_record(&cells).map_err(csv_error)?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| AnalysisError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AnalysisError::Csv(e.to_string()))
}

fn csv_error(e: csv::Error) -> AnalysisError {
    AnalysisError::Csv(e.to_string())
}

fn cell_text(v: &Json) -> String {
    match v {
        Json::String(s) => s.clone(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(v: Json) -> Vec<Record> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn integral_numbers_drop_fraction() {
        assert_eq!(number_value(3.0), json!(3));
        assert_eq!(number_value(2.5), json!(2.5));
        assert_eq!(number_value(-0.0), json!(0));
        assert_eq!(number_value(f64::NAN), Json::Null);
    }

    #[test]
    fn csv_with_union_header() {
        let rows = records(json!([
            {"country": "US", "value": 3},
            {"country": "KE", "value": 5, "note": "late"},
            {"country": null, "value": 1.5}
        ]));
        let out = to_csv(&rows).unwrap();
        assert_eq!(out, "country,value,note\nUS,3,\nKE,5,late\n,1.5,\n");
    }

    #[test]
    fn csv_quotes_and_nested() {
        let rows = records(json!([{"name": "a,b", "tags": ["x", "y"]}]));
        let out = to_csv(&rows).unwrap();
        assert_eq!(out, "name,tags\n\"a,b\",\"[\"\"x\"\",\"\"y\"\"]\"\n");
    }

    #[test]
    fn csv_empty() {
        assert_eq!(to_csv(&[]).unwrap(), "");
    }

    #[test]
    fn pretty_json() {
        let out = to_json(&json!({"key": "value"})).unwrap();
        assert!(out.contains("\"key\": \"value\""));
    }
}
