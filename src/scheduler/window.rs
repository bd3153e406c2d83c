//! Booking window: when attempts may run and which date they target
//!
//! The platform opens a class for booking a fixed number of days ahead and
//! only during business hours, both measured in the studio's local time.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Timelike, Utc};

use crate::config::SchedulerConfig;
use crate::models::format_class_date;
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use crate::utils::offset_from_hours;

/// Time-of-day gate and lead-time rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingWindow {
    /// First open hour (inclusive)
    start_hour: u32,
    /// First closed hour (exclusive)
    end_hour: u32,
    lead_days: u64,
    offset: FixedOffset,
}

impl BookingWindow {
    /// Create a window open for `start_hour <= hour < end_hour`
    pub fn new(
        start_hour: u32,
        end_hour: u32,
        lead_days: i64,
        utc_offset_hours: i32,
    ) -> SchedulerResult<Self> {
        if start_hour > 23 {
            return Err(SchedulerError::InvalidHour { hour: start_hour });
        }
        if end_hour > 24 {
            return Err(SchedulerError::InvalidHour { hour: end_hour });
        }
        if start_hour >= end_hour {
            return Err(SchedulerError::InvalidWindow {
                start_hour,
                end_hour,
            });
        }

        let lead_days = u64::try_from(lead_days)
            .map_err(|_| SchedulerError::InvalidLeadDays { days: lead_days })?;

        let offset = offset_from_hours(utc_offset_hours).ok_or(SchedulerError::InvalidTimezone {
            offset_hours: utc_offset_hours,
        })?;

        Ok(Self {
            start_hour,
            end_hour,
            lead_days,
            offset,
        })
    }

    pub fn from_config(config: &SchedulerConfig) -> SchedulerResult<Self> {
        Self::new(
            config.window_start_hour,
            config.window_end_hour,
            config.lead_days,
            config.utc_offset_hours,
        )
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Convert an instant to studio local time
    pub fn local(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset)
    }

    /// Whether booking attempts may run at `now`
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local(now).hour();
        hour >= self.start_hour && hour < self.end_hour
    }

    /// Class date that opens for booking at `now`
    pub fn target_date(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = self.local(now).date_naive();
        today
            .checked_add_days(Days::new(self.lead_days))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Target date in the platform's `MM/DD/YYYY` format
    pub fn target_date_string(&self, now: DateTime<Utc>) -> String {
        format_class_date(self.target_date(now))
    }
}

impl Default for BookingWindow {
    fn default() -> Self {
        Self {
            start_hour: 10,
            end_hour: 21,
            lead_days: 7,
            offset: FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}
