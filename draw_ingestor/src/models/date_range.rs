//! Inclusive calendar-date window used by date-range draw queries.

use chrono::{Days, NaiveDate};
use snafu::{OptionExt, ResultExt, Snafu, ensure};

/// Wire and CLI format for dates (`2024-01-31`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while building a [`DateRange`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DateRangeError {
    /// The input is not a `YYYY-MM-DD` date.
    #[snafu(display("Please enter dates in the following format => {DATE_FORMAT} (got {input:?})"))]
    Format {
        input: String,
        source: chrono::ParseError,
    },

    #[snafu(display("Start date {since} is after end date {till}"))]
    Reversed { since: NaiveDate, till: NaiveDate },

    #[snafu(display("Cannot go back {days} days"))]
    OutOfRange { days: u64 },
}

/// An inclusive `[since, till]` window of draw dates. Always `since <= till`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    since: NaiveDate,
    till: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `since > till`.
    pub fn new(since: NaiveDate, till: NaiveDate) -> Result<Self, DateRangeError> {
        ensure!(since <= till, ReversedSnafu { since, till });
        Ok(Self { since, till })
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }

    pub fn till(&self) -> NaiveDate {
        self.till
    }

    /// The last `days` days up to and including `today`.
    pub fn recent(today: NaiveDate, days: u64) -> Result<Self, DateRangeError> {
        let since = today
            .checked_sub_days(Days::new(days))
            .context(OutOfRangeSnafu { days })?;
        Self::new(since, today)
    }
}

/// Parses a single date using [`DATE_FORMAT`].
pub fn parse_date(input: &str) -> Result<NaiveDate, DateRangeError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).context(FormatSnafu { input })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date(" 2024-02-15 ").unwrap(), d(2024, 2, 15));
        let r = DateRange::new(d(2024, 1, 1), d(2024, 2, 15)).unwrap();
        assert_eq!(r.since(), d(2024, 1, 1));
        assert_eq!(r.till(), d(2024, 2, 15));
    }

    #[test]
    fn single_day_range_is_valid() {
        assert!(DateRange::new(d(2024, 3, 3), d(2024, 3, 3)).is_ok());
    }

    #[test]
    fn rejects_malformed_date() {
        let err = parse_date("01/02/2024").unwrap_err();
        assert!(matches!(err, DateRangeError::Format { ref input, .. } if input == "01/02/2024"));
        assert!(err.to_string().contains("%Y-%m-%d"));
    }

    #[test]
    fn rejects_reversed_range() {
        let err = DateRange::new(d(2024, 2, 15), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, DateRangeError::Reversed { .. }));
    }

    #[test]
    fn recent_counts_back_from_today() {
        let r = DateRange::recent(d(2024, 3, 10), 7).unwrap();
        assert_eq!((r.since(), r.till()), (d(2024, 3, 3), d(2024, 3, 10)));

        let today_only = DateRange::recent(d(2024, 3, 10), 0).unwrap();
        assert_eq!(today_only.since(), today_only.till());
    }
}
