//! Remote booking platform clients
//!
//! Every operation starts from a fresh session: a new HTTP client with its
//! own cookie jar, primed by visiting the studio home page. Sessions are
//! never shared between users or between scheduler cycles.

pub mod booking;
pub mod headers;
pub mod schedule;

pub use booking::{BookingClient, BookingGateway, Session};
pub use schedule::{CatalogSource, ScheduleClient};

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::config::{PlatformConfig, DEFAULT_BASE_URL, DEFAULT_STUDIO_ID, DEFAULT_USER_AGENT};
use headers::build_platform_headers;

/// Landing page that issues the session cookies
const HOME_PATH: &str = "/ASP/home.asp";

/// Connection settings shared by the schedule and booking clients
#[derive(Debug, Clone)]
pub struct Platform {
    base_url: String,
    studio_id: u32,
    user_agent: String,
    timeout: Duration,
}

impl Platform {
    /// Create settings for a platform at `base_url`
    pub fn new(base_url: &str, studio_id: u32) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            studio_id,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::new(&config.base_url, config.studio_id)
            .with_user_agent(&config.user_agent)
            .with_timeout(Duration::from_secs(config.request_timeout_secs))
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn studio_id(&self) -> u32 {
        self.studio_id
    }

    /// Absolute URL for a platform path
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Build a client with its own cookie store
    pub(crate) fn build_client(&self) -> reqwest::Result<Client> {
        Client::builder()
            .timeout(self.timeout)
            .gzip(true)
            .cookie_store(true)
            .user_agent(self.user_agent.as_str())
            .default_headers(build_platform_headers())
            .build()
    }

    /// Open an anonymous session by visiting the studio home page
    ///
    /// Returns the client holding the session cookies together with the
    /// home page's status so callers can map it to their own error type.
    pub(crate) async fn open_session(&self) -> reqwest::Result<(Client, StatusCode)> {
        let client = self.build_client()?;
        let response = client
            .get(self.url(HOME_PATH))
            .query(&[("studioid", self.studio_id)])
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, studio_id = self.studio_id, "Opened platform session");
        Ok((client, status))
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_STUDIO_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let platform = Platform::new("http://localhost:8080/", 831);
        assert_eq!(platform.base_url(), "http://localhost:8080");
        assert_eq!(
            platform.url("/classic/mainclass"),
            "http://localhost:8080/classic/mainclass"
        );
    }

    #[test]
    fn test_from_config() {
        let config = PlatformConfig {
            studio_id: 42,
            request_timeout_secs: 5,
            ..Default::default()
        };
        let platform = Platform::from_config(&config);
        assert_eq!(platform.studio_id(), 42);
        assert_eq!(platform.timeout, Duration::from_secs(5));
        assert_eq!(platform.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_build_client() {
        assert!(Platform::default().build_client().is_ok());
    }
}
