//! Date parsing for user supplied search ranges.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;

use crate::errors::{Error, Result};

/// Formats tried in order by [`parse_date`].
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y%m%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
];

/// Parses a free-form date string.
///
/// ```
/// use abnamro_core::dates::parse_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2019, 7, 18).unwrap();
/// assert_eq!(parse_date("2019-07-18").unwrap(), expected);
/// assert_eq!(parse_date("18/07/2019").unwrap(), expected);
/// assert_eq!(parse_date("July 18, 2019").unwrap(), expected);
/// ```
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
    {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| Error::InvalidDateFormat(input.to_string()))
}

/// Converts an epoch-millisecond timestamp into the calendar date in Amsterdam.
pub fn date_from_epoch_millis(millis: i64) -> Option<NaiveDate> {
    Amsterdam
        .timestamp_millis_opt(millis)
        .single()
        .map(|timestamp| timestamp.date_naive())
}

/// Today's date in Amsterdam, where both portals live.
pub fn today() -> NaiveDate {
    Utc::now().with_timezone(&Amsterdam).date_naive()
}

/// Inclusive date range used for searching transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range from already parsed dates.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDate(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        if start > today() {
            return Err(Error::InvalidDate(format!(
                "start date {} is in the future",
                start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parses both ends of the range from free-form strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `[start, end]` shares at least one day with this range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_parse_supported_formats() {
        let expected = ymd(2019, 12, 9);
        for input in [
            "2019-12-09",
            "2019/12/09",
            "20191209",
            "09-12-2019",
            "09/12/2019",
            "09.12.2019",
            "9 December 2019",
            "9 Dec 2019",
            "December 9, 2019",
            "Dec 9, 2019",
            "2019-12-09T10:15:00+01:00",
            "  2019-12-09 ",
        ] {
            assert_eq!(parse_date(input).unwrap(), expected, "input {:?}", input);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "yesterday", "2019-13-45", "12/2019"] {
            assert!(
                matches!(parse_date(input), Err(Error::InvalidDateFormat(_))),
                "input {:?}",
                input
            );
        }
    }

    #[test]
    fn test_reversed_range_is_invalid() {
        let result = DateRange::parse("2019-12-09", "2019-12-01");
        assert!(matches!(result, Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_future_start_is_invalid() {
        let start = today() + chrono::Duration::days(2);
        let end = start + chrono::Duration::days(2);
        assert!(matches!(DateRange::new(start, end), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_bad_format_wins_over_range_checks() {
        let result = DateRange::parse("not a date", "2019-12-01");
        assert!(matches!(result, Err(Error::InvalidDateFormat(_))));
    }

    #[test]
    fn test_contains_is_inclusive() {
        let range = DateRange::parse("2019-12-01", "2019-12-31").unwrap();
        assert!(range.contains(ymd(2019, 12, 1)));
        assert!(range.contains(ymd(2019, 12, 31)));
        assert!(!range.contains(ymd(2019, 11, 30)));
        assert!(!range.contains(ymd(2020, 1, 1)));
    }

    #[test]
    fn test_overlaps() {
        let range = DateRange::parse("2019-12-10", "2019-12-20").unwrap();
        assert!(range.overlaps(ymd(2019, 11, 19), ymd(2019, 12, 10)));
        assert!(range.overlaps(ymd(2019, 12, 20), ymd(2020, 1, 18)));
        assert!(!range.overlaps(ymd(2019, 11, 1), ymd(2019, 12, 9)));
    }

    #[test]
    fn test_epoch_millis_uses_amsterdam_calendar() {
        // 2019-07-18T22:30:00Z is already the 19th in Amsterdam (UTC+2).
        assert_eq!(date_from_epoch_millis(1_563_489_000_000), Some(ymd(2019, 7, 19)));
        assert_eq!(date_from_epoch_millis(1_563_400_000_000), Some(ymd(2019, 7, 17)));
    }
}
