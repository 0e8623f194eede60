//! Headline statistics over a filtered record set.

use serde::{Deserialize, Serialize};
use tally_query::{Fields, Record};
use tracing::debug;

use crate::export::number_value;
use crate::group::round2;

const EVENTS_FIELD: &str = "events_count";
const USERS_FIELD: &str = "users_count";
const DURATION_FIELD: &str = "avg_duration_ms";

/// Totals shown above the daily analysis views.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub records: usize,
    /// Sum of `events_count`, unconvertible values counting as 0.
    pub total_events: f64,
    /// Sum of `users_count`, unconvertible values counting as 0.
    pub total_users: f64,
    /// Mean of `avg_duration_ms` over the records where it converts to a
    /// number. 0 when none do.
    pub average_duration_ms: f64,
    /// Records that contributed to the mean duration.
    pub duration_samples: usize,
}

impl Summary {
    /// Flattens to a single record, the mean rounded to two decimals.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("records".to_string(), self.records.into());
        record.insert("totalEvents".to_string(), number_value(self.total_events));
        record.insert("totalUsers".to_string(), number_value(self.total_users));
        record.insert(
            "averageDurationMs".to_string(),
            number_value(round2(self.average_duration_ms)),
        );
        record
    }
}

/// Computes the headline totals of `records`.
///
/// `null` and blank durations convert to 0 and count as samples; missing or
/// non-numeric ones are skipped.
pub fn summarize<R: Fields>(records: &[R]) -> Summary {
    let mut summary = Summary {
        records: records.len(),
        ..Summary::default()
    };
    let mut duration_sum = 0.0;

    for record in records {
        summary.total_events += record.field(EVENTS_FIELD).number_or_zero();
        summary.total_users += record.field(USERS_FIELD).number_or_zero();

        let duration = record.field(DURATION_FIELD).to_number();
        if !duration.is_nan() {
            duration_sum += duration;
            summary.duration_samples += 1;
        }
    }

    if summary.duration_samples > 0 {
        summary.average_duration_ms = duration_sum / summary.duration_samples as f64;
    }

    debug!(
        records = summary.records,
        samples = summary.duration_samples,
        "summarized records"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value as Json};

    #[test]
    fn totals_and_mean_duration() {
        let rows = vec![
            json!({"events_count": 120, "users_count": 40, "avg_duration_ms": 100}),
            json!({"events_count": "80", "users_count": 30, "avg_duration_ms": "250.5"}),
            json!({"events_count": "n/a", "users_count": null}),
        ];
        let s = summarize(&rows);
        assert_eq!(s.records, 3);
        assert_eq!(s.total_events, 200.0);
        assert_eq!(s.total_users, 70.0);
        assert_eq!(s.duration_samples, 2);
        assert_eq!(s.average_duration_ms, 175.25);
    }

    #[test]
    fn empty_input() {
        let rows: Vec<Json> = Vec::new();
        assert_eq!(summarize(&rows), Summary::default());
    }

    #[test]
    fn no_numeric_durations() {
        let rows = vec![
            json!({"events_count": 3, "avg_duration_ms": "slow"}),
            json!({"events_count": 4}),
        ];
        let s = summarize(&rows);
        assert_eq!(s.total_events, 7.0);
        assert_eq!(s.duration_samples, 0);
        assert_eq!(s.average_duration_ms, 0.0);
    }

    #[test]
    fn null_duration_counts_as_zero() {
        let rows = vec![
            json!({"avg_duration_ms": null}),
            json!({"avg_duration_ms": 30}),
        ];
        let s = summarize(&rows);
        assert_eq!(s.duration_samples, 2);
        assert_eq!(s.average_duration_ms, 15.0);
    }

    #[test]
    fn record_shape() {
        let rows = vec![
            json!({"events_count": 1, "users_count": 1, "avg_duration_ms": 1}),
            json!({"events_count": 1, "users_count": 1, "avg_duration_ms": 2}),
            json!({"events_count": 1, "users_count": 1, "avg_duration_ms": 2}),
        ];
        assert_eq!(
            Json::Object(summarize(&rows).to_record()),
            json!({"records": 3, "totalEvents": 3, "totalUsers": 3, "averageDurationMs": 1.67})
        );
    }
}
