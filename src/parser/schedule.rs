//! Class schedule page parser
//!
//! Turns the platform's schedule table into [`ClassSlot`] records. The
//! column order and the booking-id encoding inside the sign-up button's
//! `onclick` handler are an external contract; nothing outside this module
//! depends on the markup.

use scraper::{ElementRef, Html};

use crate::models::ClassSlot;
use crate::parser::sanitize::clean_cell_text;
use crate::parser::selectors::{column, ScheduleSelectors, SKIPPED_ROWS};
use crate::utils::error::FetchError;

/// Path of the reservation action embedded in a bookable row
const RESERVE_ACTION: &str = "/ASP/res_a.asp?";

/// Query parameter holding the remote booking id
const CLASS_ID_PARAM: &str = "classId";

/// Parser for the class schedule table
pub struct ScheduleParser {
    selectors: ScheduleSelectors,
}

impl ScheduleParser {
    #[must_use]
    pub fn new() -> Self {
        Self {
            selectors: ScheduleSelectors::new(),
        }
    }

    /// Parse a schedule page into class slots for `date`
    ///
    /// Slots keep the order of the table rows and carry their position in
    /// `index`. Rows without a sign-up control get an empty booking id.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::TableNotFound` if the page has no schedule table
    pub fn parse(&self, html: &str, date: &str) -> Result<Vec<ClassSlot>, FetchError> {
        let document = Html::parse_document(html);

        let mut tables = document.select(self.selectors.table).peekable();
        if tables.peek().is_none() {
            return Err(FetchError::TableNotFound);
        }

        let mut slots = Vec::new();
        for table in tables {
            for row in table.select(self.selectors.row).skip(SKIPPED_ROWS) {
                let slot = self.parse_row(row, date, slots.len());
                slots.push(slot);
            }
        }

        tracing::debug!(date, slots = slots.len(), "Parsed schedule table");
        Ok(slots)
    }

    fn parse_row(&self, row: ElementRef<'_>, date: &str, index: usize) -> ClassSlot {
        let mut slot = ClassSlot {
            index,
            date: date.to_string(),
            ..Default::default()
        };

        for (position, cell) in row.select(self.selectors.cell).enumerate() {
            let text = clean_cell_text(&cell.text().collect::<String>());

            match position {
                column::TIME => slot.time = text,
                column::BOOKING => {
                    if let Some(id) = self.booking_id(cell) {
                        slot.id = id;
                    }
                }
                column::CLASS => {
                    slot.name = text;
                    slot.name_id = self.anchor_name(cell);
                }
                column::TEACHER => {
                    slot.teacher = text;
                    slot.teacher_id = self.anchor_name(cell);
                }
                column::LOCATION => slot.location = text,
                column::DURATION => slot.duration = text,
                _ => {}
            }
        }

        slot
    }

    fn booking_id(&self, cell: ElementRef<'_>) -> Option<String> {
        let onclick = cell
            .select(self.selectors.booking_input)
            .find_map(|input| input.value().attr("onclick"))?;
        extract_booking_id(onclick)
    }

    fn anchor_name(&self, cell: ElementRef<'_>) -> String {
        cell.select(self.selectors.anchor)
            .next()
            .and_then(|a| a.value().attr("name"))
            .unwrap_or_default()
            .to_string()
    }
}

impl Default for ScheduleParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the booking id from a sign-up button's `onclick` handler
///
/// The handler navigates to `/ASP/res_a.asp?...&classId=<id>&...`; anything
/// else (waitlist buttons, disabled rows) yields `None`.
///
/// # Examples
///
/// ```
/// use classhold::parser::schedule::extract_booking_id;
///
/// let onclick = "document.location='/ASP/res_a.asp?tg=22&classId=12345&classDate=3/8/2024';";
/// assert_eq!(extract_booking_id(onclick).as_deref(), Some("12345"));
/// assert_eq!(extract_booking_id("alert('full')"), None);
/// ```
pub fn extract_booking_id(onclick: &str) -> Option<String> {
    let start = onclick.find(RESERVE_ACTION)? + RESERVE_ACTION.len();
    let query = &onclick[start..];
    let end = query
        .find(|c: char| matches!(c, '\'' | '"' | ';' | ')') || c.is_whitespace())
        .unwrap_or(query.len());

    url::form_urlencoded::parse(query[..end].as_bytes())
        .find(|(key, _)| key == CLASS_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE: &str = "03/08/2024";

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <table id="classSchedule-mainTable">
                <tr><th>Start time</th><th></th><th>Class</th><th>Teacher</th><th>Assistant</th><th>Location</th><th>Duration</th></tr>
                <tr><td colspan="7">Fri March 8, 2024</td></tr>
                {rows}
            </table>
            </body></html>"#
        )
    }

    const BOOKABLE_ROW: &str = r#"
        <tr>
            <td>6:00 PM&nbsp;</td>
            <td><input type="button" value="Sign Up" onclick="document.location='/ASP/res_a.asp?tg=22&amp;classId=12345&amp;classDate=3/8/2024&amp;clsLoc=1';"></td>
            <td><a name="cid1">Hot Yoga &amp; Core</a></td>
            <td><a name="bio1">Jane
                Doe</a></td>
            <td></td>
            <td>Studio A</td>
            <td>1 hour</td>
        </tr>"#;

    const CLOSED_ROW: &str = r#"
        <tr>
            <td>7:30 PM</td>
            <td>Full</td>
            <td><a name="cid2">Pilates</a></td>
            <td><a name="bio2">John Roe</a></td>
            <td></td>
            <td>Studio B</td>
            <td>45 min</td>
        </tr>"#;

    #[test]
    fn test_parse_bookable_row() {
        let parser = ScheduleParser::new();
        let slots = parser.parse(&page(BOOKABLE_ROW), DATE).unwrap();

        assert_eq!(slots.len(), 1);
        let slot = &slots[0];
        assert_eq!(slot.index, 0);
        assert_eq!(slot.date, DATE);
        assert_eq!(slot.time, "6:00PM");
        assert_eq!(slot.id, "12345");
        assert_eq!(slot.name, "HotYoga&Core");
        assert_eq!(slot.name_id, "cid1");
        assert_eq!(slot.teacher, "JaneDoe");
        assert_eq!(slot.teacher_id, "bio1");
        assert_eq!(slot.location, "StudioA");
        assert_eq!(slot.duration, "1hour");
    }

    #[test]
    fn test_parse_row_without_booking_control() {
        let parser = ScheduleParser::new();
        let slots = parser
            .parse(&page(&format!("{BOOKABLE_ROW}{CLOSED_ROW}")), DATE)
            .unwrap();

        assert_eq!(slots.len(), 2);
        assert_eq!(slots[1].index, 1);
        assert_eq!(slots[1].id, "");
        assert!(!slots[1].is_bookable());
        assert_eq!(slots[1].name_id, "cid2");
        assert_eq!(slots[1].teacher_id, "bio2");
    }

    #[test]
    fn test_header_rows_are_skipped() {
        let parser = ScheduleParser::new();
        let slots = parser.parse(&page(""), DATE).unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn test_missing_table_is_error() {
        let parser = ScheduleParser::new();
        let result = parser.parse("<html><body><p>Maintenance</p></body></html>", DATE);
        assert!(matches!(result, Err(FetchError::TableNotFound)));
    }

    #[test]
    fn test_extract_booking_id_first_param() {
        let onclick = "location.href='/ASP/res_a.asp?classId=999&classDate=3/8/2024'";
        assert_eq!(extract_booking_id(onclick).as_deref(), Some("999"));
    }

    #[test]
    fn test_extract_booking_id_missing_param() {
        let onclick = "location.href='/ASP/res_a.asp?tg=22&classDate=3/8/2024'";
        assert_eq!(extract_booking_id(onclick), None);
    }

    #[test]
    fn test_extract_booking_id_other_action() {
        let onclick = "location.href='/ASP/waitlist.asp?classId=999'";
        assert_eq!(extract_booking_id(onclick), None);
    }
}
