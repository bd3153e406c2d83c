// Core data structures for classhold

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by the booking platform (e.g. "03/08/2024")
pub const CLASS_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse a date in the platform's `MM/DD/YYYY` format
///
/// Only the canonical form is accepted: two-digit month and day and a
/// four-digit year, so a stored date always equals the scheduler's target
/// date string for that day.
pub fn parse_class_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, CLASS_DATE_FORMAT)
        .ok()
        .filter(|parsed| format_class_date(*parsed) == date)
}

/// Format a date in the platform's `MM/DD/YYYY` format
pub fn format_class_date(date: NaiveDate) -> String {
    date.format(CLASS_DATE_FORMAT).to_string()
}

/// Lifecycle state of a reservation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Done,
}

impl ReservationStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
        }
    }
}

impl From<bool> for ReservationStatus {
    fn from(is_done: bool) -> Self {
        if is_done {
            Self::Done
        } else {
            Self::Pending
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite key correlating a reservation with a catalog slot
///
/// The remote booking id is deliberately not part of the key: it only
/// shows up once the platform opens the slot for booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey<'a> {
    pub date: &'a str,
    pub time: &'a str,
    pub name_id: &'a str,
    pub teacher_id: &'a str,
}

/// Reservation intent as submitted, before the store assigns an id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub email: String,
    /// Class date in `MM/DD/YYYY`
    pub date: String,
    pub time: String,
    /// Class name identifier (e.g. `cid1764796689`)
    #[serde(alias = "nameID", alias = "NameID")]
    pub name_id: String,
    /// Teacher identifier (e.g. `bio100000157`)
    #[serde(alias = "teacherID", alias = "TeacherID")]
    pub teacher_id: String,
}

/// Stored reservation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub id: i64,
    pub email: String,
    pub date: String,
    pub time: String,
    pub name_id: String,
    pub teacher_id: String,
    pub status: ReservationStatus,
    /// Failed booking attempts so far
    pub attempts: u32,
    pub last_error: Option<String>,
}

impl ReservationRequest {
    pub fn slot_key(&self) -> SlotKey<'_> {
        SlotKey {
            date: &self.date,
            time: &self.time,
            name_id: &self.name_id,
            teacher_id: &self.teacher_id,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ReservationStatus::Pending
    }
}

impl std::fmt::Display for ReservationRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} {} {} {}/{} ({})",
            self.id, self.email, self.date, self.time, self.name_id, self.teacher_id, self.status
        )
    }
}

/// One class occurrence as seen in a single catalog fetch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSlot {
    /// Position within the fetched catalog
    pub index: usize,
    /// Remote booking id; empty when the slot cannot be booked yet
    pub id: String,
    pub date: String,
    pub time: String,
    pub name: String,
    pub name_id: String,
    pub teacher: String,
    pub teacher_id: String,
    pub location: String,
    pub duration: String,
}

impl ClassSlot {
    pub fn slot_key(&self) -> SlotKey<'_> {
        SlotKey {
            date: &self.date,
            time: &self.time,
            name_id: &self.name_id,
            teacher_id: &self.teacher_id,
        }
    }

    pub fn is_bookable(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Per-user secret material for the booking platform
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub password: String,
    /// Payment reference number charged for the booking
    pub payment_ref: String,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("password", &"<redacted>")
            .field("payment_ref", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_date_roundtrip_format() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 8).unwrap();
        assert_eq!(format_class_date(date), "03/08/2024");
        assert_eq!(parse_class_date("03/08/2024"), Some(date));
    }

    #[test]
    fn test_parse_class_date_rejects_iso() {
        assert!(parse_class_date("2024-03-08").is_none());
        assert!(parse_class_date("13/01/2024").is_none());
    }

    #[test]
    fn test_parse_class_date_requires_padded_fields() {
        assert!(parse_class_date("3/8/2024").is_none());
        assert!(parse_class_date("03/08/24").is_none());
        assert!(parse_class_date("03/8/2024").is_none());
        assert!(parse_class_date("03/08/2024").is_some());
    }

    #[test]
    fn test_slot_key_matches_between_request_and_slot() {
        let request = ReservationRequest {
            id: 1,
            email: "user@x".to_string(),
            date: "03/08/2024".to_string(),
            time: "6:00PM".to_string(),
            name_id: "cid1".to_string(),
            teacher_id: "bio1".to_string(),
            status: ReservationStatus::Pending,
            attempts: 0,
            last_error: None,
        };
        let slot = ClassSlot {
            date: "03/08/2024".to_string(),
            time: "6:00PM".to_string(),
            name_id: "cid1".to_string(),
            teacher_id: "bio1".to_string(),
            ..Default::default()
        };

        assert_eq!(request.slot_key(), slot.slot_key());
        assert!(!slot.is_bookable());
    }

    #[test]
    fn test_status_from_flag() {
        assert_eq!(ReservationStatus::from(true), ReservationStatus::Done);
        assert_eq!(ReservationStatus::from(false), ReservationStatus::Pending);
        assert_eq!(ReservationStatus::Done.to_string(), "done");
    }

    #[test]
    fn test_credential_debug_is_redacted() {
        let credential = Credential {
            password: "hunter2".to_string(),
            payment_ref: "PMT-1".to_string(),
        };
        let debug = format!("{credential:?}");
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("PMT-1"));
    }

    #[test]
    fn test_new_reservation_accepts_legacy_field_names() {
        let json = r#"{"email":"a@b","date":"03/08/2024","time":"6:00PM","nameID":"cid1","teacherID":"bio1"}"#;
        let parsed: NewReservation = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.name_id, "cid1");
        assert_eq!(parsed.teacher_id, "bio1");
    }
}
