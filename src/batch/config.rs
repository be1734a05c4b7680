use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Settings for processing a folder of invoice documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// File extension to pick up, compared case-insensitively.
    pub extension: String,
    /// Keep only invoices issued within this range.
    pub date_range: Option<DateRange>,
    /// Process files in path order instead of directory-listing order.
    pub sort_inputs: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extension: "xml".into(),
            date_range: None,
            sort_inputs: true,
        }
    }
}

/// Inclusive issue-date filter. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// Whole calendar days, from the start of `first` to the last
    /// instant of `last` (UTC).
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let start = first.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        let end = last
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .map(|dt| dt.and_utc());
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether an invoice with this issue date passes the filter. Undated
    /// invoices pass only when both bounds are open.
    pub fn contains(&self, date: Option<DateTime<Utc>>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(date) = date else {
            return false;
        };
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn unbounded_accepts_undated() {
        assert!(DateRange::default().contains(None));
        assert!(DateRange::default().contains(Some(at(2024, 1, 1, 0))));
    }

    #[test]
    fn any_bound_rejects_undated() {
        let range = DateRange::new(Some(at(2024, 1, 1, 0)), None);
        assert!(!range.contains(None));
        let range = DateRange::new(None, Some(at(2024, 1, 1, 0)));
        assert!(!range.contains(None));
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(Some(at(2024, 3, 1, 0)), Some(at(2024, 3, 31, 0)));
        assert!(range.contains(Some(at(2024, 3, 1, 0))));
        assert!(range.contains(Some(at(2024, 3, 31, 0))));
        assert!(!range.contains(Some(at(2024, 3, 31, 1))));
        assert!(!range.contains(Some(at(2024, 2, 29, 23))));
    }

    #[test]
    fn days_cover_last_day() {
        let range = DateRange::days(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        );
        assert!(range.contains(Some(at(2024, 3, 31, 23))));
        assert!(!range.contains(Some(at(2024, 4, 1, 0))));
    }

    #[test]
    fn default_config() {
        let config = BatchConfig::default();
        assert_eq!(config.extension, "xml");
        assert!(config.sort_inputs);
        assert!(config.date_range.is_none());
    }
}
