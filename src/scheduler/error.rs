//! Error types for the scheduler module

use std::fmt;

use crate::storage::StoreError;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler-specific errors
#[derive(Debug)]
pub enum SchedulerError {
    /// Invalid hour value (must be 0-24)
    InvalidHour { hour: u32 },

    /// Window start is not before window end
    InvalidWindow { start_hour: u32, end_hour: u32 },

    /// Negative booking lead
    InvalidLeadDays { days: i64 },

    /// UTC offset outside the representable range
    InvalidTimezone { offset_hours: i32 },

    /// Tick interval of zero
    InvalidTickInterval,

    /// Reservation store failure
    StoreError { operation: String, reason: String },

    /// `start` was called while the loop is already running
    AlreadyRunning,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHour { hour } => {
                write!(f, "Invalid hour '{}'. Must be 0-24", hour)
            }
            Self::InvalidWindow {
                start_hour,
                end_hour,
            } => {
                write!(
                    f,
                    "Invalid booking window {}..{}: start must be before end",
                    start_hour, end_hour
                )
            }
            Self::InvalidLeadDays { days } => {
                write!(f, "Invalid lead days '{}'. Must not be negative", days)
            }
            Self::InvalidTimezone { offset_hours } => {
                write!(f, "Invalid UTC offset: {:+} hours", offset_hours)
            }
            Self::InvalidTickInterval => {
                write!(f, "Tick interval must be greater than zero")
            }
            Self::StoreError { operation, reason } => {
                write!(f, "Store error during '{}': {}", operation, reason)
            }
            Self::AlreadyRunning => {
                write!(f, "Reserver loop is already running")
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Wrap a store failure with the operation that hit it
    pub fn store(operation: &str, err: StoreError) -> Self {
        Self::StoreError {
            operation: operation.to_string(),
            reason: err.to_string(),
        }
    }

    /// Whether the loop can keep ticking after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::StoreError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = SchedulerError::InvalidWindow {
            start_hour: 21,
            end_hour: 10,
        };
        assert_eq!(
            err.to_string(),
            "Invalid booking window 21..10: start must be before end"
        );

        let err = SchedulerError::InvalidTimezone { offset_hours: 30 };
        assert_eq!(err.to_string(), "Invalid UTC offset: +30 hours");
    }

    #[test]
    fn test_store_error_is_recoverable() {
        let err = SchedulerError::store("list_pending", StoreError::LockPoisoned);
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("list_pending"));
        assert!(!SchedulerError::AlreadyRunning.is_recoverable());
    }
}
