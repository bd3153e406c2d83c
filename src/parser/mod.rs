//! HTML parsing and data extraction
//!
//! This module handles parsing the booking platform's schedule page and
//! extracting structured class slots.

pub mod sanitize;
pub mod schedule;
pub mod selectors;

pub use sanitize::{clean_cell_text, strip_whitespace};
pub use schedule::{extract_booking_id, ScheduleParser};
pub use selectors::ScheduleSelectors;
