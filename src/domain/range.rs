use anyhow::{Result, anyhow};
use chrono::{Days, NaiveDate};
use serde::Serialize;

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// IMAP `date` production, e.g. `02-Mar-2024`.
const IMAP_DATE_FORMAT: &str = "%d-%b-%Y";

/// Parse a user supplied `DD-MM-YYYY` date.
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| anyhow!("invalid date '{}', expected DD-MM-YYYY", input.trim()))
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(anyhow!(
                "start date {} is after end date {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Search key for the first day of the range.
    pub fn imap_since(&self) -> String {
        self.start.format(IMAP_DATE_FORMAT).to_string()
    }

    /// Search key for the day after the range (BEFORE is exclusive).
    pub fn imap_before(&self) -> String {
        self.end
            .checked_add_days(Days::new(1))
            .unwrap_or(self.end)
            .format(IMAP_DATE_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_day_month_year() {
        assert_eq!(parse_date(" 02-03-2024 ").unwrap(), d(2024, 3, 2));
        assert!(parse_date("2024-03-02").is_err());
        assert!(parse_date("31-02-2024").is_err());
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(DateRange::new(d(2024, 3, 2), d(2024, 3, 1)).is_err());
        assert!(DateRange::new(d(2024, 3, 2), d(2024, 3, 2)).is_ok());
    }

    #[test]
    fn range_is_inclusive() {
        let r = DateRange::new(d(2024, 3, 1), d(2024, 3, 31)).unwrap();
        assert!(r.contains(d(2024, 3, 1)));
        assert!(r.contains(d(2024, 3, 31)));
        assert!(!r.contains(d(2024, 4, 1)));
    }

    #[test]
    fn imap_search_keys_cover_the_last_day() {
        let r = DateRange::new(d(2024, 2, 1), d(2024, 2, 29)).unwrap();
        assert_eq!(r.imap_since(), "01-Feb-2024");
        assert_eq!(r.imap_before(), "01-Mar-2024");
    }
}
