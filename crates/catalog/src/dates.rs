//! Acquisition date ranges

use crate::error::{CatalogError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open calendar date range `[start, end)`.
///
/// A scene acquired at any time on `start` is included, a scene acquired on
/// `end` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end <= start {
            return Err(CatalogError::InvalidDate {
                value: format!("{}/{}", start, end),
                reason: "end must be after start".into(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` dates
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Whether an acquisition timestamp falls inside the range
    pub fn contains(&self, acquired: &DateTime<Utc>) -> bool {
        let start = self.start.and_time(NaiveTime::MIN).and_utc();
        let end = self.end.and_time(NaiveTime::MIN).and_utc();
        *acquired >= start && *acquired < end
    }

    /// Length of the range in days
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

pub(crate) fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| CatalogError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (taken as midnight UTC)
pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    parse_date(value).map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_half_open() {
        let range = DateRange::parse("2024-03-01", "2024-04-01").unwrap();
        assert!(range.contains(&parse_timestamp("2024-03-01T00:00:00Z").unwrap()));
        assert!(range.contains(&parse_timestamp("2024-03-31T23:59:59Z").unwrap()));
        assert!(!range.contains(&parse_timestamp("2024-04-01T00:00:00Z").unwrap()));
        assert_eq!(range.days(), 31);
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert!(DateRange::parse("2024-04-01", "2024-03-01").is_err());
        assert!(DateRange::parse("2024-04-01", "2024-04-01").is_err());
    }

    #[test]
    fn bad_date_is_reported() {
        match DateRange::parse("2024-13-01", "2024-14-01") {
            Err(CatalogError::InvalidDate { value, .. }) => assert_eq!(value, "2024-13-01"),
            other => panic!("expected InvalidDate, got {:?}", other),
        }
    }

    #[test]
    fn timestamp_accepts_offsets_and_dates() {
        let a = parse_timestamp("2023-09-14T10:35:00+02:00").unwrap();
        let b = parse_timestamp("2023-09-14T08:35:00Z").unwrap();
        assert_eq!(a, b);
        assert!(parse_timestamp("2023-09-14").is_ok());
    }
}
