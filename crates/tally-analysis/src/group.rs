//! Group-by aggregation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_query::{Fields, Record};
use tracing::debug;

use crate::dimension::dimension_key;
use crate::error::AnalysisError;
use crate::export::number_value;

/// How a bucket of records reduces to one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Bucket size. The measure is ignored.
    #[default]
    Count,
    Sum,
    /// Sum divided by bucket size.
    Avg,
    Min,
    Max,
}

impl Aggregation {
    pub const ALL: [Aggregation; 5] = [
        Aggregation::Count,
        Aggregation::Sum,
        Aggregation::Avg,
        Aggregation::Min,
        Aggregation::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalysisError::UnknownAggregation(s.to_string()))
    }
}

/// One bucket of a grouping: its dimension value and the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub dimension: String,
    pub value: f64,
}

impl GroupRow {
    /// Flattens to `{<dimension_field>: dimension, "value": value}`.
    pub fn to_record(&self, dimension_field: &str) -> Record {
        let mut record = Record::new();
        record.insert(dimension_field.to_string(), self.dimension.clone().into());
        record.insert("value".to_string(), number_value(self.value));
        record
    }
}

#[derive(Default)]
struct Bucket {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Bucket {
    fn push(&mut self, x: f64) {
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
        self.count += 1;
        self.sum += x;
    }

    fn reduce(&self, aggregation: Aggregation) -> f64 {
        match aggregation {
            Aggregation::Count => self.count as f64,
            Aggregation::Sum => self.sum,
            Aggregation::Avg if self.count == 0 => 0.0,
            Aggregation::Avg => self.sum / self.count as f64,
            Aggregation::Min => self.min,
            Aggregation::Max => self.max,
        }
    }
}

/// Buckets records by `dimension` and reduces each bucket.
///
/// Values of `measure` are converted to numbers, with anything non-numeric
/// counting as 0. Results are rounded to two decimals and listed in the order
/// each dimension value first appears.
///
/// ```
/// use serde_json::json;
/// use tally_analysis::{group_data, Aggregation};
///
/// let rows = vec![
///     json!({"c": "US", "n": 1}),
///     json!({"c": "US", "n": 2}),
///     json!({"c": "KE", "n": 5}),
/// ];
/// let groups = group_data(&rows, "c", Aggregation::Sum, "n");
/// assert_eq!(groups[0].dimension, "US");
/// assert_eq!(groups[0].value, 3.0);
/// assert_eq!(groups[1].dimension, "KE");
/// assert_eq!(groups[1].value, 5.0);
/// ```
pub fn group_data<R: Fields>(
    records: &[R],
    dimension: &str,
    aggregation: Aggregation,
    measure: &str,
) -> Vec<GroupRow> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Bucket)> = Vec::new();

    for record in records {
        let key = dimension_key(record, dimension);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, Bucket::default()));
                buckets.len() - 1
            }
        };
        let x = if aggregation == Aggregation::Count {
            0.0
        } else {
            record.field(measure).number_or_zero()
        };
        buckets[slot].1.push(x);
    }

    debug!(
        records = records.len(),
        groups = buckets.len(),
        %aggregation,
        dimension,
        "grouped records"
    );

    buckets
        .into_iter()
        .map(|(dimension, bucket)| GroupRow {
            dimension,
            value: round2(bucket.reduce(aggregation)),
        })
        .collect()
}

/// Rounds to two decimals, with halves rounding toward positive infinity.
pub fn round2(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

fn round_half_up(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
