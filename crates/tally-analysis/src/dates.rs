//! Calendar-day ranges over the `day` field of records.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tally_query::Fields;

use crate::error::{AnalysisError, Result};

/// Field holding a record's calendar day as `YYYY-MM-DD`.
pub const DAY_FIELD: &str = "day";

/// An inclusive range of instants, persisted as ISO 8601 strings.
///
/// Records are compared by calendar day: a record passes when its `day` lies
/// between the UTC dates of `from` and `to`, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// Creates a range, rejecting one that ends before it starts.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if to < from {
            return Err(AnalysisError::InvertedRange {
                from: from.to_rfc3339(),
                to: to.to_rfc3339(),
            });
        }
        Ok(DateRange { from, to })
    }

    /// Builds a range covering whole days, from the start of `from` to the
    /// last instant of `to`.
    pub fn from_days(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let start = Utc.from_utc_datetime(&from.and_time(NaiveTime::MIN));
        let end = Utc.from_utc_datetime(&end_of_day(to));
        DateRange::new(start, end)
    }

    /// Parses two `YYYY-MM-DD` strings into a whole-day range.
    pub fn parse_days(from: &str, to: &str) -> Result<Self> {
        DateRange::from_days(parse_day(from)?, parse_day(to)?)
    }

    /// The calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Result<Self> {
        let first = NaiveDate::from_ymd_opt(date.year(), date.month(), 1);
        let next_first = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
        };
        match (first, next_first.and_then(|d| d.pred_opt())) {
            (Some(first), Some(last)) => DateRange::from_days(first, last),
            _ => Err(AnalysisError::InvertedRange {
                from: date.to_string(),
                to: date.to_string(),
            }),
        }
    }

    /// First and last calendar day covered.
    pub fn days(&self) -> (NaiveDate, NaiveDate) {
        (self.from.date_naive(), self.to.date_naive())
    }

    /// Returns `true` if `day` falls within the range.
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        let (first, last) = self.days();
        first <= day && day <= last
    }

    /// Returns `true` if the record's `day` field parses and falls within the
    /// range. Records without a usable day never match.
    pub fn contains_record<R: Fields + ?Sized>(&self, record: &R) -> bool {
        record
            .field(DAY_FIELD)
            .as_str()
            .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
            .is_some_and(|day| self.contains_day(day))
    }
}

fn end_of_day(day: NaiveDate) -> chrono::NaiveDateTime {
    day.and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_else(|| day.and_time(NaiveTime::MIN))
}

/// Parses a `YYYY-MM-DD` day.
pub fn parse_day(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|source| {
        AnalysisError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        parse_day(s).unwrap()
    }

    #[test]
    fn whole_day_bounds() {
        let range = DateRange::parse_days("2025-03-01", "2025-03-31").unwrap();
        assert_eq!(range.days(), (day("2025-03-01"), day("2025-03-31")));
        assert_eq!(range.to.to_rfc3339(), "2025-03-31T23:59:59.999+00:00");
    }

    #[test]
    fn inclusive_membership() {
        let range = DateRange::parse_days("2025-03-01", "2025-03-03").unwrap();
        assert!(range.contains_day(day("2025-03-01")));
        assert!(range.contains_day(day("2025-03-03")));
        assert!(!range.contains_day(day("2025-02-28")));
        assert!(!range.contains_day(day("2025-03-04")));
    }

    #[test]
    fn records_by_day_field() {
        let range = DateRange::parse_days("2025-03-01", "2025-03-03").unwrap();
        assert!(range.contains_record(&json!({"day": "2025-03-02"})));
        assert!(!range.contains_record(&json!({"day": "2025-04-02"})));
        assert!(!range.contains_record(&json!({"day": "yesterday"})));
        assert!(!range.contains_record(&json!({"timestamp": "2025-03-02T10:00:00Z"})));
    }

    #[test]
    fn month_ranges() {
        let feb = DateRange::month_of(day("2024-02-17")).unwrap();
        assert_eq!(feb.days(), (day("2024-02-01"), day("2024-02-29")));

        let dec = DateRange::month_of(day("2025-12-05")).unwrap();
        assert_eq!(dec.days(), (day("2025-12-01"), day("2025-12-31")));
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(matches!(
            DateRange::parse_days("2025-03-02", "2025-03-01"),
            Err(AnalysisError::InvertedRange { .. })
        ));
    }

    #[test]
    fn bad_day_rejected() {
        assert!(matches!(
            parse_day("03/01/2025"),
            Err(AnalysisError::InvalidDate { .. })
        ));
    }

    #[test]
    fn iso_round_trip() {
        let range: DateRange = serde_json::from_value(json!({
            "from": "2025-01-01T00:00:00.000Z",
            "to": "2025-01-31T23:59:59.999Z"
        }))
        .unwrap();
        assert_eq!(range.days(), (day("2025-01-01"), day("2025-01-31")));
        let back = serde_json::to_value(range).unwrap();
        let again: DateRange = serde_json::from_value(back).unwrap();
        assert_eq!(again, range);
    }
}
