use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date format used when none is configured, e.g. "Jan 10, 2024".
pub const DEFAULT_DATE_FORMAT: &str = "%b %d, %Y";

/// Timestamps with an explicit offset that RFC 3339 parsing rejects.
/// A trailing `Z` is rewritten to `+00:00` before these are tried.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Timestamps without an offset (datetime-local and space-separated forms).
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Assignment {
    pub course: String,
    pub title: String,
    /// ISO 8601 timestamp or date, kept as sent by the API
    pub due: String,
}

impl Assignment {
    /// Calendar date of the due timestamp, in the timestamp's own offset.
    pub fn due_date(&self) -> Option<NaiveDate> {
        let due = self.due.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(due) {
            return Some(dt.date_naive());
        }

        let zulu;
        let with_offset = match due.strip_suffix(|c: char| c == 'Z' || c == 'z') {
            Some(rest) => {
                zulu = format!("{}+00:00", rest);
                zulu.as_str()
            }
            None => due,
        };
        for format in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(with_offset, format) {
                return Some(dt.date_naive());
            }
        }

        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(due, format) {
                return Some(dt.date());
            }
        }
        NaiveDate::parse_from_str(due, "%Y-%m-%d").ok()
    }

    /// Due date formatted for display.
    /// Falls back to the raw value when it is not a recognizable date, and to
    /// `DEFAULT_DATE_FORMAT` when `format` is not a valid strftime string.
    pub fn due_display(&self, format: &str) -> String {
        let Some(date) = self.due_date() else {
            return self.due.clone();
        };

        let mut out = String::new();
        if write!(out, "{}", date.format(format)).is_ok() {
            out
        } else {
            date.format(DEFAULT_DATE_FORMAT).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn due(value: &str) -> Assignment {
        Assignment {
            course: "CS50".to_string(),
            title: "PSet 1".to_string(),
            due: value.to_string(),
        }
    }

    #[test]
    fn test_due_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10);
        assert_eq!(due("2024-01-10").due_date(), expected);
        assert_eq!(due("2024-01-10T23:59:00Z").due_date(), expected);
        assert_eq!(due("2024-01-10T23:59:00-07:00").due_date(), expected);
        assert_eq!(due("2024-01-10T08:00:00").due_date(), expected);
        assert_eq!(due("next tuesday").due_date(), None);
    }

    #[test]
    fn test_due_date_minute_precision_and_space_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10);
        assert_eq!(due("2024-01-10T23:59Z").due_date(), expected);
        assert_eq!(due("2024-01-10T23:59+05:30").due_date(), expected);
        assert_eq!(due("2024-01-10T23:59-0700").due_date(), expected);
        assert_eq!(due("2024-01-10T23:59").due_date(), expected);
        assert_eq!(due("2024-01-10 23:59:00").due_date(), expected);
        assert_eq!(due("2024-01-10 23:59:00.250").due_date(), expected);
        assert_eq!(due("2024-01-10 23:59").due_date(), expected);
        assert_eq!(due("2024-01-10 23:59:00+01:00").due_date(), expected);

        for raw in ["2024-01-10T23:59Z", "2024-01-10T23:59", "2024-01-10 23:59:00"] {
            assert_eq!(due(raw).due_display(DEFAULT_DATE_FORMAT), "Jan 10, 2024");
        }
    }

    #[test]
    fn test_due_date_keeps_timestamp_offset() {
        // Late evening in UTC-8 is already the next day in UTC.
        assert_eq!(
            due("2024-01-10T23:30-08:00").due_date(),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );
    }

    #[test]
    fn test_due_display() {
        assert_eq!(due("2024-01-10").due_display(DEFAULT_DATE_FORMAT), "Jan 10, 2024");
        assert_eq!(due("2024-01-10").due_display("%Y/%m/%d"), "2024/01/10");
        assert_eq!(due("soon").due_display(DEFAULT_DATE_FORMAT), "soon");
    }

    #[test]
    fn test_due_display_invalid_format_falls_back() {
        assert_eq!(due("2024-01-10").due_display("%Q"), "Jan 10, 2024");
    }

    #[test]
    fn test_assignment_list_parses() {
        let json = r#"[{"course":"CS50","title":"PSet 1","due":"2024-01-10"}]"#;
        let list: Vec<Assignment> = serde_json::from_str(json).unwrap();
        assert_eq!(list, vec![due("2024-01-10")]);
    }
}
