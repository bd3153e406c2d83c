//! Resolve a reservation request to a bookable catalog slot

use thiserror::Error;

use crate::models::{ClassSlot, ReservationRequest};

/// Why a request could not be paired with a slot
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    /// No slot in the catalog has the request's key
    #[error("No catalog slot matches the request")]
    NotFound,

    /// The matching slot is listed but not open for booking yet
    #[error("Matching slot has no booking id")]
    NotBookable,
}

/// Find the slot a request should be booked into
///
/// Slots are scanned in catalog order and the first one whose
/// (date, time, name_id, teacher_id) equals the request's wins; later
/// duplicates are ignored even if the first has no booking id.
pub fn find_bookable<'a>(
    request: &ReservationRequest,
    slots: &'a [ClassSlot],
) -> Result<&'a ClassSlot, MatchError> {
    let key = request.slot_key();
    let slot = slots
        .iter()
        .find(|slot| slot.slot_key() == key)
        .ok_or(MatchError::NotFound)?;

    if slot.is_bookable() {
        Ok(slot)
    } else {
        Err(MatchError::NotBookable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReservationStatus;

    fn request() -> ReservationRequest {
        ReservationRequest {
            id: 1,
            email: "user@example.com".to_string(),
            date: "03/08/2024".to_string(),
            time: "6:00PM".to_string(),
            name_id: "cid1".to_string(),
            teacher_id: "bio1".to_string(),
            status: ReservationStatus::Pending,
            attempts: 0,
            last_error: None,
        }
    }

    fn slot(index: usize, id: &str, time: &str) -> ClassSlot {
        ClassSlot {
            index,
            id: id.to_string(),
            date: "03/08/2024".to_string(),
            time: time.to_string(),
            name_id: "cid1".to_string(),
            teacher_id: "bio1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_match_wins() {
        let slots = vec![
            slot(0, "100", "5:00PM"),
            slot(1, "200", "6:00PM"),
            slot(2, "300", "6:00PM"),
        ];
        let found = find_bookable(&request(), &slots).unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.id, "200");
    }

    #[test]
    fn test_no_match() {
        let slots = vec![slot(0, "100", "5:00PM")];
        assert_eq!(find_bookable(&request(), &slots), Err(MatchError::NotFound));
        assert_eq!(find_bookable(&request(), &[]), Err(MatchError::NotFound));
    }

    #[test]
    fn test_match_without_booking_id() {
        let slots = vec![slot(0, "", "6:00PM"), slot(1, "200", "6:00PM")];
        assert_eq!(
            find_bookable(&request(), &slots),
            Err(MatchError::NotBookable)
        );
    }

    #[test]
    fn test_teacher_must_match() {
        let mut other = slot(0, "100", "6:00PM");
        other.teacher_id = "bio2".to_string();
        assert_eq!(
            find_bookable(&request(), &[other]),
            Err(MatchError::NotFound)
        );
    }
}
