//! Common test utilities

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

use classhold::credentials::StaticCredentials;
use classhold::models::{ClassSlot, Credential, NewReservation};
use classhold::platform::{BookingGateway, CatalogSource, Session};
use classhold::utils::error::{AuthError, BookingError, FetchError};

pub const USER: &str = "user@example.com";
pub const TARGET_DATE: &str = "03/08/2024";

/// Instant at `hour:00` on 2024-03-`day` in UTC+8
pub fn local_time(day: u32, hour: u32) -> DateTime<Utc> {
    FixedOffset::east_opt(8 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, day, hour, 0, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn credential() -> Credential {
    Credential {
        password: "secret".to_string(),
        payment_ref: "PMT-100".to_string(),
    }
}

pub fn credentials_with_user() -> Arc<StaticCredentials> {
    let credentials = StaticCredentials::new();
    credentials.insert(USER, credential());
    Arc::new(credentials)
}

pub fn new_reservation(email: &str, date: &str, time: &str, name_id: &str, teacher_id: &str) -> NewReservation {
    NewReservation {
        email: email.to_string(),
        date: date.to_string(),
        time: time.to_string(),
        name_id: name_id.to_string(),
        teacher_id: teacher_id.to_string(),
    }
}

pub fn slot(index: usize, id: &str, time: &str, name_id: &str, teacher_id: &str) -> ClassSlot {
    ClassSlot {
        index,
        id: id.to_string(),
        date: TARGET_DATE.to_string(),
        time: time.to_string(),
        name: "Yoga".to_string(),
        name_id: name_id.to_string(),
        teacher: "JaneDoe".to_string(),
        teacher_id: teacher_id.to_string(),
        location: "StudioA".to_string(),
        duration: "1hour".to_string(),
    }
}

// ============================================================================
// Schedule page fixtures
// ============================================================================

/// Schedule page with the header and date-banner rows followed by `rows`
pub fn schedule_page(rows: &[String]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><body>
<table id="classSchedule-mainTable">
  <tr><th>Start time</th><th></th><th>Classes</th><th>Teacher</th><th>Assistant</th><th>Location</th><th>Duration</th></tr>
  <tr><td colspan="7">Fri March 8, 2024</td></tr>
  {}
</table>
</body></html>"#,
        rows.join("\n")
    )
}

/// One schedule row; `booking_id` of `None` renders a row without sign-up button
pub fn schedule_row(
    time: &str,
    booking_id: Option<&str>,
    class: &str,
    name_id: &str,
    teacher: &str,
    teacher_id: &str,
) -> String {
    let booking = match booking_id {
        Some(id) => format!(
            r#"<input type="button" value="Sign Up Now" onclick="promptLogin(); document.location='/ASP/res_a.asp?tg=22&amp;classId={id}&amp;classDate=3/8/2024&amp;clsLoc=1';">"#
        ),
        None => "<span>Full</span>".to_string(),
    };

    format!(
        r#"<tr>
    <td>{time}&nbsp;</td>
    <td>{booking}</td>
    <td><a name="{name_id}" class="modalClassDesc">{class}</a></td>
    <td><a name="{teacher_id}" class="modalBio">{teacher}</a></td>
    <td>&nbsp;</td>
    <td>Studio A</td>
    <td>1 hour</td>
  </tr>"#
    )
}

// ============================================================================
// Remote platform fakes
// ============================================================================

/// Catalog source returning a fixed result and counting calls
pub struct FakeCatalog {
    slots: Option<Vec<ClassSlot>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn with_slots(slots: Vec<ClassSlot>) -> Arc<Self> {
        Arc::new(Self {
            slots: Some(slots),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            slots: None,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn fetch_catalog(&self, date: &str) -> Result<Vec<ClassSlot>, FetchError> {
        self.calls.lock().unwrap().push(date.to_string());
        match &self.slots {
            Some(slots) => Ok(slots.clone()),
            None => Err(FetchError::Status(503)),
        }
    }
}

/// Catalog source whose every fetch takes `delay`, tracking overlap
pub struct SlowCatalog {
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl SlowCatalog {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most fetches ever in flight at once
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for SlowCatalog {
    async fn fetch_catalog(&self, _date: &str) -> Result<Vec<ClassSlot>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

/// How the fake gateway answers a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayBehavior {
    Accept,
    RejectLogin,
    SchedulingClosed,
}

/// Booking gateway that records every call
pub struct FakeGateway {
    behavior: Mutex<GatewayBehavior>,
    logins: Mutex<Vec<String>>,
    submissions: Mutex<Vec<(String, String, String)>>,
}

impl FakeGateway {
    pub fn new(behavior: GatewayBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            logins: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        })
    }

    pub fn set_behavior(&self, behavior: GatewayBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn logins(&self) -> Vec<String> {
        self.logins.lock().unwrap().clone()
    }

    /// Submitted (email, date, booking id) triples
    pub fn submissions(&self) -> Vec<(String, String, String)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingGateway for FakeGateway {
    async fn authenticate(&self, email: &str, _credential: &Credential) -> Result<Session, AuthError> {
        self.logins.lock().unwrap().push(email.to_string());
        if *self.behavior.lock().unwrap() == GatewayBehavior::RejectLogin {
            return Err(AuthError::Rejected {
                email: email.to_string(),
            });
        }
        Ok(Session::new(reqwest::Client::new(), email))
    }

    async fn submit_booking(
        &self,
        session: &Session,
        date: &str,
        booking_id: &str,
        _credential: &Credential,
    ) -> Result<(), BookingError> {
        self.submissions.lock().unwrap().push((
            session.email().to_string(),
            date.to_string(),
            booking_id.to_string(),
        ));
        match *self.behavior.lock().unwrap() {
            GatewayBehavior::SchedulingClosed => Err(BookingError::Closed {
                booking_id: booking_id.to_string(),
            }),
            _ => Ok(()),
        }
    }
}
