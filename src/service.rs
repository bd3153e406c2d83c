//! Inbound reservation operations
//!
//! Shared by the HTTP API and the CLI: submitting a reservation intent and
//! reading a date's class catalog.

use std::sync::Arc;

use thiserror::Error;

use crate::credentials::SharedCredentialLookup;
use crate::models::{parse_class_date, ClassSlot, NewReservation};
use crate::parser::strip_whitespace;
use crate::platform::CatalogSource;
use crate::storage::{ReservationStats, SharedReservationRepository, StoreError};
use crate::utils::error::FetchError;

/// Errors returned to callers of the inbound operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No credentials are configured for the email
    #[error("user not exists")]
    UnknownUser(String),

    /// Date is not `MM/DD/YYYY`
    #[error("invalid date '{0}': expected MM/DD/YYYY")]
    InvalidDate(String),

    /// A required key field is empty
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Whether the caller sent a bad request
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidDate(_) | Self::MissingField(_))
    }
}

/// Reservation submission and catalog queries
#[derive(Clone)]
pub struct ReservationService {
    repository: SharedReservationRepository,
    catalog: Arc<dyn CatalogSource>,
    credentials: SharedCredentialLookup,
}

impl ReservationService {
    pub fn new(
        repository: SharedReservationRepository,
        catalog: Arc<dyn CatalogSource>,
        credentials: SharedCredentialLookup,
    ) -> Self {
        Self {
            repository,
            catalog,
            credentials,
        }
    }

    /// Record a new pending reservation and return its id
    ///
    /// Key fields are stripped of whitespace the same way catalog cells
    /// are, so a request copied from the catalog view matches it.
    pub fn submit(&self, reservation: NewReservation) -> Result<i64, ServiceError> {
        let reservation = normalize(reservation);

        if parse_class_date(&reservation.date).is_none() {
            return Err(ServiceError::InvalidDate(reservation.date));
        }
        for (field, value) in [
            ("time", &reservation.time),
            ("nameId", &reservation.name_id),
            ("teacherId", &reservation.teacher_id),
        ] {
            if value.is_empty() {
                return Err(ServiceError::MissingField(field));
            }
        }

        if !self.credentials.contains(&reservation.email) {
            tracing::warn!(email = %reservation.email, "Reservation rejected for unknown user");
            return Err(ServiceError::UnknownUser(reservation.email));
        }

        let id = self.repository.create(&reservation)?;
        tracing::info!(
            id,
            email = %reservation.email,
            date = %reservation.date,
            time = %reservation.time,
            name_id = %reservation.name_id,
            teacher_id = %reservation.teacher_id,
            "Reservation recorded"
        );
        Ok(id)
    }

    /// Fetch the live catalog for `date`
    pub async fn classes(&self, date: &str) -> Result<Vec<ClassSlot>, ServiceError> {
        let date = date.trim();
        if parse_class_date(date).is_none() {
            return Err(ServiceError::InvalidDate(date.to_string()));
        }
        Ok(self.catalog.fetch_catalog(date).await?)
    }

    pub fn stats(&self) -> Result<ReservationStats, ServiceError> {
        Ok(self.repository.stats()?)
    }
}

fn normalize(reservation: NewReservation) -> NewReservation {
    NewReservation {
        email: reservation.email.trim().to_string(),
        date: reservation.date.trim().to_string(),
        time: strip_whitespace(&reservation.time),
        name_id: strip_whitespace(&reservation.name_id),
        teacher_id: strip_whitespace(&reservation.teacher_id),
    }
}
