//! Error types for the remote platform clients
//!
//! Each remote operation has its own error kind so the scheduler can log
//! which step of a booking attempt failed.

use thiserror::Error;

/// Errors that can occur while fetching the class catalog
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected status code from the platform
    #[error("Server returned status {0}")]
    Status(u16),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// The schedule table is missing from the returned page
    #[error("Schedule table not found in catalog page")]
    TableNotFound,
}

impl FetchError {
    /// Map a transport error, distinguishing timeouts
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::TableNotFound)
    }
}

/// Errors that can occur while logging in as an end-user
#[derive(Error, Debug)]
pub enum AuthError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Unexpected status code from the platform
    #[error("Login returned status {0}")]
    Status(u16),

    /// The platform answered but refused the credentials
    #[error("Login rejected for {email}")]
    Rejected { email: String },

    /// The login envelope could not be interpreted
    #[error("Malformed login response: {0}")]
    MalformedResponse(String),
}

/// Errors that can occur while submitting a booking
#[derive(Error, Debug)]
pub enum BookingError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-OK status from the booking endpoint
    #[error("Booking failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Platform reports scheduling for the class is not open
    #[error("Scheduling is closed for class {booking_id}")]
    Closed { booking_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_recoverable() {
        assert!(FetchError::Timeout.is_recoverable());
        assert!(FetchError::Status(503).is_recoverable());
        assert!(!FetchError::TableNotFound.is_recoverable());
    }

    #[test]
    fn test_booking_error_display() {
        let err = BookingError::Closed {
            booking_id: "12345".to_string(),
        };
        assert!(err.to_string().contains("12345"));

        let err = BookingError::Status {
            status: 500,
            body: "oops".to_string(),
        };
        assert!(err.to_string().contains("500"));
    }
}
