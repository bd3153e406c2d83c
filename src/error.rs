//! Unified error types for classhold
//!
//! Domain errors live next to the code that raises them; this module folds
//! them into one [`Error`] with a category and a recoverability flag for
//! callers that only need to decide whether to keep going.

use std::io;
use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::service::ServiceError;
pub use crate::storage::StoreError;
pub use crate::utils::error::{AuthError, BookingError, FetchError};

/// Common behaviour of classhold errors
pub trait ClassholdErrorTrait: std::error::Error {
    /// Whether retrying the operation later may succeed
    fn is_recoverable(&self) -> bool;

    fn category(&self) -> ErrorCategory;
}

/// Error category for grouping and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Booking,
    Storage,
    Config,
    Scheduler,
    Validation,
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::Booking => "booking",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Scheduler => "scheduler",
            Self::Validation => "validation",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ClassholdErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Auth(e) => !matches!(e, AuthError::Rejected { .. }),
            // Closed scheduling opens later; other rejections may too
            Self::Booking(_) => true,
            Self::Store(e) => !matches!(e, StoreError::NotFound(_)),
            Self::Scheduler(e) => e.is_recoverable(),
            Self::Service(e) => match e {
                ServiceError::Fetch(inner) => inner.is_recoverable(),
                ServiceError::Store(_) => true,
                _ => false,
            },
            Self::Io(_) => true,
            Self::Http(_) => true,
            Self::Config(_) => false,
            Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(_) | Self::Http(_) => ErrorCategory::Network,
            Self::Auth(_) => ErrorCategory::Authentication,
            Self::Booking(_) => ErrorCategory::Booking,
            Self::Store(_) | Self::Io(_) => ErrorCategory::Storage,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Service(e) => match e {
                ServiceError::Fetch(_) => ErrorCategory::Network,
                ServiceError::Store(_) => ErrorCategory::Storage,
                _ => ErrorCategory::Validation,
            },
            Self::Config(_) => ErrorCategory::Config,
            Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            Error::from(FetchError::Timeout).category(),
            ErrorCategory::Network
        );
        assert_eq!(
            Error::from(StoreError::NotFound(1)).category(),
            ErrorCategory::Storage
        );
        assert_eq!(
            Error::from(ServiceError::InvalidDate("x".to_string())).category(),
            ErrorCategory::Validation
        );
        assert_eq!(Error::config("bad").category(), ErrorCategory::Config);
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::from(FetchError::Status(503)).is_recoverable());
        assert!(!Error::from(FetchError::TableNotFound).is_recoverable());
        assert!(!Error::from(AuthError::Rejected {
            email: "a@b".to_string()
        })
        .is_recoverable());
        assert!(Error::from(BookingError::Closed {
            booking_id: "1".to_string()
        })
        .is_recoverable());
        assert!(!Error::from(StoreError::NotFound(7)).is_recoverable());
        assert!(!Error::other("boom").is_recoverable());
    }

    #[test]
    fn test_with_source_keeps_chain() {
        let io = io::Error::new(io::ErrorKind::Other, "disk");
        let err = Error::with_source("loading store", io);
        assert_eq!(err.to_string(), "loading store");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Authentication.to_string(), "authentication");
    }
}
