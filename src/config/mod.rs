//! Configuration management for classhold
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::Credential;

/// Default booking platform endpoint
pub const DEFAULT_BASE_URL: &str = "https://clients.mindbodyonline.com";

/// Default studio identifier on the platform
pub const DEFAULT_STUDIO_ID: u32 = 831;

/// Browser user agent the platform expects
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/69.0.3497.100 Safari/537.36";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote booking platform
    pub platform: PlatformConfig,

    /// Reservation loop timing
    pub scheduler: SchedulerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// HTTP API configuration
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Per-user credentials keyed by email
    pub credentials: BTreeMap<String, Credential>,
}

/// Booking platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL of the platform
    pub base_url: String,

    /// Studio identifier sent as `studioid`
    pub studio_id: u32,

    /// User agent string
    pub user_agent: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            studio_id: DEFAULT_STUDIO_ID,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Reservation loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between ticks
    pub tick_interval_secs: u64,

    /// First local hour (inclusive) at which booking attempts run
    pub window_start_hour: u32,

    /// Local hour (exclusive) at which booking attempts stop
    pub window_end_hour: u32,

    /// Days ahead of today that the platform opens bookings
    pub lead_days: i64,

    /// Offset of the studio's local time from UTC, in hours
    pub utc_offset_hours: i32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 2,
            window_start_hour: 10,
            window_end_hour: 21,
            lead_days: 7,
            utc_offset_hours: 8,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/reservations.db"),
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the API to
    pub bind_address: SocketAddr,

    /// Enable permissive CORS
    pub enable_cors: bool,

    /// Enable request tracing
    pub enable_request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            enable_request_logging: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Standalone credentials file: `[credentials."user@example.com"]` tables
#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: BTreeMap<String, Credential>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Credentials are read from the TOML file named by
    /// `CLASSHOLD_CREDENTIALS_FILE`, if set.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let platform = PlatformConfig {
            base_url: std::env::var("CLASSHOLD_BASE_URL")
                .unwrap_or(defaults.platform.base_url),
            studio_id: env_parse("CLASSHOLD_STUDIO_ID").unwrap_or(defaults.platform.studio_id),
            user_agent: std::env::var("CLASSHOLD_USER_AGENT")
                .unwrap_or(defaults.platform.user_agent),
            request_timeout_secs: env_parse("CLASSHOLD_REQUEST_TIMEOUT")
                .unwrap_or(defaults.platform.request_timeout_secs),
        };

        let scheduler = SchedulerConfig {
            tick_interval_secs: env_parse("CLASSHOLD_TICK_SECS")
                .unwrap_or(defaults.scheduler.tick_interval_secs),
            window_start_hour: env_parse("CLASSHOLD_WINDOW_START")
                .unwrap_or(defaults.scheduler.window_start_hour),
            window_end_hour: env_parse("CLASSHOLD_WINDOW_END")
                .unwrap_or(defaults.scheduler.window_end_hour),
            lead_days: env_parse("CLASSHOLD_LEAD_DAYS").unwrap_or(defaults.scheduler.lead_days),
            utc_offset_hours: env_parse("CLASSHOLD_UTC_OFFSET")
                .unwrap_or(defaults.scheduler.utc_offset_hours),
        };

        let sqlite_path = std::env::var("CLASSHOLD_SQLITE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database.sqlite_path);

        let bind_address = match std::env::var("CLASSHOLD_BIND") {
            Ok(addr) => addr
                .parse()
                .with_context(|| format!("Invalid CLASSHOLD_BIND address: {addr}"))?,
            Err(_) => defaults.server.bind_address,
        };

        let credentials = match std::env::var("CLASSHOLD_CREDENTIALS_FILE") {
            Ok(path) => Self::load_credentials(Path::new(&path))?,
            Err(_) => BTreeMap::new(),
        };

        Ok(Self {
            platform,
            scheduler,
            database: DatabaseConfig { sqlite_path },
            server: ServerConfig {
                bind_address,
                ..defaults.server
            },
            logging: LoggingConfig {
                level: std::env::var("CLASSHOLD_LOG_LEVEL").unwrap_or(defaults.logging.level),
                format: std::env::var("CLASSHOLD_LOG_FORMAT")
                    .unwrap_or(defaults.logging.format),
            },
            credentials,
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load a credentials table from a TOML file
    pub fn load_credentials(path: &Path) -> Result<BTreeMap<String, Credential>> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;

        let file: CredentialsFile = toml::from_str(&content).with_context(|| {
            format!("Failed to parse credentials file: {}", path.display())
        })?;

        Ok(file.credentials)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.platform.base_url.is_empty() {
            anyhow::bail!("platform.base_url must not be empty");
        }

        if self.platform.request_timeout_secs == 0 {
            anyhow::bail!("platform.request_timeout_secs must be greater than 0");
        }

        if self.scheduler.tick_interval_secs == 0 {
            anyhow::bail!("scheduler.tick_interval_secs must be greater than 0");
        }

        if self.scheduler.window_end_hour > 24
            || self.scheduler.window_start_hour >= self.scheduler.window_end_hour
        {
            anyhow::bail!(
                "scheduler window {}..{} is not a valid hour range",
                self.scheduler.window_start_hour,
                self.scheduler.window_end_hour
            );
        }

        if self.scheduler.lead_days < 0 {
            anyhow::bail!("scheduler.lead_days must not be negative");
        }

        if !(-12..=14).contains(&self.scheduler.utc_offset_hours) {
            anyhow::bail!(
                "scheduler.utc_offset_hours {} is out of range",
                self.scheduler.utc_offset_hours
            );
        }

        Ok(())
    }

    /// Get tick interval as Duration
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.platform.studio_id, 831);
        assert_eq!(config.scheduler.lead_days, 7);
    }

    #[test]
    fn test_invalid_window() {
        let mut config = Config::default();
        config.scheduler.window_start_hour = 21;
        config.scheduler.window_end_hour = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_interval_rejected() {
        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_durations() {
        let config = Config::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[platform]
studio_id = 42

[scheduler]
lead_days = 3

[credentials."user@example.com"]
password = "secret"
payment_ref = "PMT-9"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.platform.studio_id, 42);
        assert_eq!(config.platform.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.scheduler.lead_days, 3);
        assert_eq!(config.scheduler.tick_interval_secs, 2);

        let credential = config.credentials.get("user@example.com").unwrap();
        assert_eq!(credential.payment_ref, "PMT-9");
    }

    #[test]
    fn test_load_credentials_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[credentials."a@b.c"]
password = "pw"
payment_ref = "ref"
"#
        )
        .unwrap();

        let credentials = Config::load_credentials(file.path()).unwrap();
        assert_eq!(credentials.len(), 1);
        assert!(credentials.contains_key("a@b.c"));
    }
}
