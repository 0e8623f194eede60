//! Pivot tables: one row per row-dimension value, one column per
//! column-dimension value, cells holding a count or a sum.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tally_query::{Fields, Record};
use tracing::debug;

use crate::dimension::{dimension_key, TOTAL};
use crate::export::number_value;

/// What a pivot cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueMeasure {
    /// Number of records in the cell.
    #[default]
    Count,
    /// Sum of a numeric field over the cell's records.
    Sum(String),
}

impl ValueMeasure {
    /// `"count"` selects [`ValueMeasure::Count`]; anything else names the
    /// field to sum.
    pub fn parse(s: &str) -> ValueMeasure {
        match s.trim() {
            "" | "count" => ValueMeasure::Count,
            field => ValueMeasure::Sum(field.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ValueMeasure::Count => "count",
            ValueMeasure::Sum(field) => field,
        }
    }
}

/// Layout of a pivot table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    pub row_dimension: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_dimension: Option<String>,
    #[serde(default)]
    pub value: ValueMeasure,
}

impl PivotConfig {
    pub fn new(row_dimension: impl Into<String>) -> Self {
        PivotConfig {
            row_dimension: row_dimension.into(),
            ..PivotConfig::default()
        }
    }

    pub fn columns(mut self, column_dimension: impl Into<String>) -> Self {
        self.column_dimension = Some(column_dimension.into());
        self
    }

    pub fn value(mut self, value: ValueMeasure) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// One distinct column-dimension value, or the single `Total` column
    /// when no column dimension is set.
    Value,
    /// Row total across every value column.
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotColumn {
    pub header: String,
    pub kind: ColumnKind,
}

/// One output row. `cells` line up with [`PivotTable::columns`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotRow {
    pub key: String,
    pub cells: Vec<f64>,
}

/// A computed pivot table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotTable {
    pub row_dimension: String,
    pub columns: Vec<PivotColumn>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    /// Looks up the cell at `row_key` and `header`.
    pub fn cell(&self, row_key: &str, header: &str) -> Option<f64> {
        let col = self.columns.iter().position(|c| c.header == header)?;
        let row = self.rows.iter().find(|r| r.key == row_key)?;
        row.cells.get(col).copied()
    }

    /// Column headers in display order, excluding the row dimension.
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.header.as_str())
    }

    /// Keys of the flattened records: the row dimension, then one per column.
    ///
    /// A header equal to an earlier key gets a ` (2)`, ` (3)`, ... suffix, so
    /// a column value named `Total` or named like the row dimension keeps its
    /// own cell.
    pub fn record_keys(&self) -> Vec<String> {
        let mut taken: HashSet<String> = HashSet::new();
        taken.insert(self.row_dimension.clone());

        let mut keys = vec![self.row_dimension.clone()];
        for column in &self.columns {
            let mut key = column.header.clone();
            let mut n = 2;
            while taken.contains(&key) {
                key = format!("{} ({n})", column.header);
                n += 1;
            }
            taken.insert(key.clone());
            keys.push(key);
        }
        keys
    }

    /// Flattens to `{<row_dimension>: key, <header>: cell, ...}` per row,
    /// keyed by [`PivotTable::record_keys`].
    pub fn to_records(&self) -> Vec<Record> {
        let keys = self.record_keys();
        let Some((row_key, cell_keys)) = keys.split_first() else {
            return Vec::new();
        };
        self.rows
            .iter()
            .map(|row| {
                let mut record = Record::new();
                record.insert(row_key.clone(), row.key.clone().into());
                for (key, cell) in cell_keys.iter().zip(&row.cells) {
                    record.insert(key.clone(), number_value(*cell));
                }
                record
            })
            .collect()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Cell {
    count: usize,
    sum: f64,
}

impl Cell {
    fn value(&self, measure: &ValueMeasure) -> f64 {
        match measure {
            ValueMeasure::Count => self.count as f64,
            ValueMeasure::Sum(_) => self.sum,
        }
    }
}

/// Cross-tabulates records.
///
/// Row and column keys appear in first-occurrence order; missing dimension
/// values key as `Unknown`. Without a column dimension every row has a single
/// `Total` column. With one, a `Total` column summing the row is appended.
/// Cells with no records are 0.
///
/// ```
/// use serde_json::json;
/// use tally_analysis::{create_pivot_table, PivotConfig};
///
/// let rows = vec![
///     json!({"platform": "ios", "country": "US"}),
///     json!({"platform": "ios", "country": "KE"}),
///     json!({"platform": "web", "country": "US"}),
/// ];
/// let table = create_pivot_table(&rows, &PivotConfig::new("platform").columns("country"));
/// assert_eq!(table.headers().collect::<Vec<_>>(), vec!["US", "KE", "Total"]);
/// assert_eq!(table.cell("ios", "Total"), Some(2.0));
/// assert_eq!(table.cell("web", "KE"), Some(0.0));
/// ```
pub fn create_pivot_table<R: Fields>(records: &[R], config: &PivotConfig) -> PivotTable {
    let mut row_index: HashMap<String, usize> = HashMap::new();
    let mut col_index: HashMap<String, usize> = HashMap::new();
    let mut row_keys: Vec<String> = Vec::new();
    let mut col_keys: Vec<String> = Vec::new();
    let mut cells: HashMap<(usize, usize), Cell> = HashMap::new();

    let column_dimension = config
        .column_dimension
        .as_deref()
        .filter(|d| !d.is_empty());

    for record in records {
        let row_key = dimension_key(record, &config.row_dimension);
        let col_key = match column_dimension {
            Some(dim) => dimension_key(record, dim),
            None => TOTAL.to_string(),
        };
        let r = intern(&mut row_index, &mut row_keys, row_key);
        let c = intern(&mut col_index, &mut col_keys, col_key);

        let cell = cells.entry((r, c)).or_default();
        cell.count += 1;
        if let ValueMeasure::Sum(field) = &config.value {
            cell.sum += record.field(field).number_or_zero();
        }
    }

    // Without a column dimension the table still has one Total column.
    if col_keys.is_empty() && column_dimension.is_none() {
        col_keys.push(TOTAL.to_string());
    }

    let mut columns: Vec<PivotColumn> = col_keys
        .iter()
        .map(|header| PivotColumn {
            header: header.clone(),
            kind: ColumnKind::Value,
        })
        .collect();
    let with_total = column_dimension.is_some();
    if with_total {
        columns.push(PivotColumn {
            header: TOTAL.to_string(),
            kind: ColumnKind::Total,
        });
    }

    let rows: Vec<PivotRow> = row_keys
        .into_iter()
        .enumerate()
        .map(|(r, key)| {
            let mut values: Vec<f64> = (0..col_keys.len())
                .map(|c| {
                    cells
                        .get(&(r, c))
                        .map_or(0.0, |cell| cell.value(&config.value))
                })
                .collect();
            if with_total {
                values.push(values.iter().sum());
            }
            PivotRow { key, cells: values }
        })
        .collect();

    debug!(
        records = records.len(),
        rows = rows.len(),
        columns = columns.len(),
        "built pivot table"
    );

    PivotTable {
        row_dimension: config.row_dimension.clone(),
        columns,
        rows,
    }
}

fn intern(index: &mut HashMap<String, usize>, keys: &mut Vec<String>, key: String) -> usize {
    if let Some(&i) = index.get(&key) {
        return i;
    }
    let i = keys.len();
    index.insert(key.clone(), i);
    keys.push(key);
    i
}
