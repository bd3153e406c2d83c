//! CSS selectors for the platform's class schedule page

use scraper::Selector;
use std::sync::LazyLock;

macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

static SCHEDULE_TABLE: LazyLock<Selector> =
    LazyLock::new(|| parse_selector!("table#classSchedule-mainTable"));

static ROW: LazyLock<Selector> = LazyLock::new(|| parse_selector!("tr"));

static CELL: LazyLock<Selector> = LazyLock::new(|| parse_selector!("td"));

static BOOKING_INPUT: LazyLock<Selector> = LazyLock::new(|| parse_selector!("input"));

static ANCHOR: LazyLock<Selector> = LazyLock::new(|| parse_selector!("a"));

/// Selectors for the schedule table
pub struct ScheduleSelectors {
    pub table: &'static Selector,
    pub row: &'static Selector,
    pub cell: &'static Selector,
    /// Sign-up button inside the booking cell
    pub booking_input: &'static Selector,
    /// Anchor carrying the class/teacher identifier in its `name`
    pub anchor: &'static Selector,
}

impl ScheduleSelectors {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: &SCHEDULE_TABLE,
            row: &ROW,
            cell: &CELL,
            booking_input: &BOOKING_INPUT,
            anchor: &ANCHOR,
        }
    }
}

impl Default for ScheduleSelectors {
    fn default() -> Self {
        Self::new()
    }
}

/// Column positions of the schedule table
pub mod column {
    pub const TIME: usize = 0;
    pub const BOOKING: usize = 1;
    pub const CLASS: usize = 2;
    pub const TEACHER: usize = 3;
    pub const ASSISTANT: usize = 4;
    pub const LOCATION: usize = 5;
    pub const DURATION: usize = 6;
}

/// Rows before the first class row (header and date banner)
pub const SKIPPED_ROWS: usize = 2;

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let selectors = ScheduleSelectors::new();
        let html = Html::parse_document(
            r#"<table id="classSchedule-mainTable"><tr><td><a name="cid1">Yoga</a></td></tr></table>"#,
        );

        let table = html.select(selectors.table).next();
        assert!(table.is_some());
        let anchor = html.select(selectors.anchor).next().unwrap();
        assert_eq!(anchor.value().attr("name"), Some("cid1"));
    }
}
