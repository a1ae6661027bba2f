//! Calendar arithmetic for billing periods
//!
//! Billing calendars are date based (no time of day), so everything here works
//! on [`NaiveDate`]. Month stepping follows chrono's rules: adding a month to
//! the 31st lands on the last day of a shorter month.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to calendar operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid range: start {start} must not be after end {end}")]
    InvalidRange {
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Date out of range: {date} + {months} months")]
    OutOfRange {
        date: NaiveDate,
        months: u32,
    },
}

/// Adds whole months to a date, clamping the day to the target month's length
pub fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, TemporalError> {
    date.checked_add_months(Months::new(months))
        .ok_or(TemporalError::OutOfRange { date, months })
}

/// An inclusive date range, e.g. the billing period of an open contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TemporalError> {
        if start > end {
            return Err(TemporalError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days covered, both ends inclusive
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_add_months_keeps_day() {
        assert_eq!(add_months(date(2024, 1, 15), 11).unwrap(), date(2024, 12, 15));
        assert_eq!(add_months(date(2024, 3, 1), 0).unwrap(), date(2024, 3, 1));
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2024, 1, 31), 1).unwrap(), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 1, 31), 1).unwrap(), date(2023, 2, 28));
    }

    #[test]
    fn test_add_months_crosses_year() {
        assert_eq!(add_months(date(2024, 11, 30), 3).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_range_rejects_reversed_bounds() {
        let result = DateRange::new(date(2024, 2, 1), date(2024, 1, 1));
        assert!(matches!(result, Err(TemporalError::InvalidRange { .. })));
    }
}
