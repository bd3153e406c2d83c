//! Authenticated booking client
//!
//! A booking attempt is two steps: [`BookingGateway::authenticate`] logs in
//! as the end-user on a fresh session, then
//! [`BookingGateway::submit_booking`] posts the reservation on that session.
//! Submissions are not idempotent; callers must not resubmit within the
//! same cycle.

use async_trait::async_trait;
use chrono::FixedOffset;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;

use crate::models::Credential;
use crate::platform::Platform;
use crate::utils::error::{AuthError, BookingError};
use crate::utils::{iso_date, now_at, truncate_text};

const LOGIN_PATH: &str = "/Login";
const RESERVE_PATH: &str = "/ASP/res_deb.asp";

/// Marker the platform prints when a class does not accept bookings yet
pub const SCHEDULING_CLOSED_MARKER: &str = "Scheduling is currently closed.";

/// Authenticated state for a single user, good for one submission
pub struct Session {
    client: Client,
    email: String,
}

impl Session {
    /// Wrap an HTTP client that already carries the user's login cookies
    pub fn new(client: Client, email: impl Into<String>) -> Self {
        Self {
            client,
            email: email.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("email", &self.email).finish()
    }
}

/// Capability to book classes on behalf of users
#[async_trait]
pub trait BookingGateway: Send + Sync {
    /// Log in as `email`
    async fn authenticate(&self, email: &str, credential: &Credential)
        -> Result<Session, AuthError>;

    /// Book slot `booking_id` on `date` (`MM/DD/YYYY`)
    async fn submit_booking(
        &self,
        session: &Session,
        date: &str,
        booking_id: &str,
        credential: &Credential,
    ) -> Result<(), BookingError>;
}

#[derive(Debug, Deserialize)]
struct LoginEnvelope {
    json: LoginStatus,
}

#[derive(Debug, Deserialize)]
struct LoginStatus {
    success: bool,
}

/// Parse the login response envelope `{"json": {"success": bool}}`
///
/// # Errors
///
/// Returns `AuthError::MalformedResponse` if the body has a different shape
pub fn parse_login_response(body: &str) -> Result<bool, AuthError> {
    serde_json::from_str::<LoginEnvelope>(body)
        .map(|envelope| envelope.json.success)
        .map_err(|e| {
            AuthError::MalformedResponse(format!("{e}: {}", truncate_text(body, 200)))
        })
}

/// Booking client for the platform
pub struct BookingClient {
    platform: Platform,
    /// Studio local time, used for the login form's date field
    offset: FixedOffset,
}

impl BookingClient {
    pub fn new(platform: Platform, offset: FixedOffset) -> Self {
        Self { platform, offset }
    }
}

#[async_trait]
impl BookingGateway for BookingClient {
    async fn authenticate(
        &self,
        email: &str,
        credential: &Credential,
    ) -> Result<Session, AuthError> {
        let (client, status) = self.platform.open_session().await?;
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16()));
        }

        let today = iso_date(now_at(self.offset).date_naive());
        let form = [
            ("date", today.as_str()),
            ("classid", "0"),
            ("requiredtxtUserName", email),
            ("requiredtxtPassword", credential.password.as_str()),
        ];

        let response = client
            .post(self.platform.url(LOGIN_PATH))
            .query(&[("studioid", self.platform.studio_id().to_string())])
            .query(&[("isLibAsync", "true"), ("isJson", "true")])
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if !parse_login_response(&body)? {
            return Err(AuthError::Rejected {
                email: email.to_string(),
            });
        }

        tracing::debug!(email, "Logged in to booking platform");
        Ok(Session::new(client, email))
    }

    async fn submit_booking(
        &self,
        session: &Session,
        date: &str,
        booking_id: &str,
        credential: &Credential,
    ) -> Result<(), BookingError> {
        let response = session
            .client
            .post(self.platform.url(RESERVE_PATH))
            .query(&[("studioid", self.platform.studio_id().to_string())])
            .query(&[
                ("classDate", date),
                ("classID", booking_id),
                ("pmtRefNo", credential.payment_ref.as_str()),
                ("courseid", ""),
                ("clsLoc", "1"),
                ("typeGroupID", "1"),
                ("recurring", "false"),
                ("wlID", ""),
            ])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            return Err(BookingError::Status {
                status: status.as_u16(),
                body: truncate_text(&body, 200),
            });
        }

        if body.contains(SCHEDULING_CLOSED_MARKER) {
            return Err(BookingError::Closed {
                booking_id: booking_id.to_string(),
            });
        }

        tracing::debug!(email = session.email(), date, booking_id, "Booking accepted");
        Ok(())
    }
}
