//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Build a fixed UTC offset from whole hours
pub fn offset_from_hours(hours: i32) -> Option<FixedOffset> {
    hours.checked_mul(3600).and_then(FixedOffset::east_opt)
}

/// Current wall-clock time at the given offset
pub fn now_at(offset: FixedOffset) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&offset)
}

/// Format a date as `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Truncate text to a maximum number of characters
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_offset_from_hours() {
        let offset = offset_from_hours(8).unwrap();
        assert_eq!(offset.local_minus_utc(), 8 * 3600);
        assert!(offset_from_hours(30).is_none());
        assert!(offset_from_hours(i32::MAX).is_none());
        assert!(offset_from_hours(i32::MIN).is_none());
    }

    #[test]
    fn test_now_at_offset() {
        let offset = offset_from_hours(0).unwrap();
        let now = now_at(offset);
        assert!(now.hour() < 24);
    }

    #[test]
    fn test_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(iso_date(date), "2024-03-01");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very lo...");
    }
}
