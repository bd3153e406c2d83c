//! Application wiring
//!
//! Builds the store, platform clients, service and reservation loop from a
//! [`Config`].

use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{SharedCredentialLookup, StaticCredentials};
use crate::error::{Error, Result};
use crate::platform::{BookingClient, Platform, ScheduleClient};
use crate::scheduler::{BookingWindow, Reserver};
use crate::service::ReservationService;
use crate::storage::{open_repository, SharedReservationRepository};

/// Fully wired application components
pub struct App {
    pub config: Config,
    pub repository: SharedReservationRepository,
    pub credentials: SharedCredentialLookup,
    pub service: ReservationService,
    pub reserver: Arc<Reserver>,
}

impl App {
    /// Validate `config` and build every component
    pub fn from_config(config: Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::config(e.to_string()))?;

        let window = BookingWindow::from_config(&config.scheduler)?;
        let repository = open_repository(&config.database)?;
        Ok(Self::assemble(config, window, repository))
    }

    /// Build on top of an existing store
    pub fn with_repository(config: Config, repository: SharedReservationRepository) -> Result<Self> {
        let window = BookingWindow::from_config(&config.scheduler)?;
        Ok(Self::assemble(config, window, repository))
    }

    fn assemble(
        config: Config,
        window: BookingWindow,
        repository: SharedReservationRepository,
    ) -> Self {
        let platform = Platform::from_config(&config.platform);
        let catalog = Arc::new(ScheduleClient::new(platform.clone()));
        let gateway = Arc::new(BookingClient::new(platform, window.offset()));
        let credentials: SharedCredentialLookup =
            Arc::new(StaticCredentials::from(config.credentials.clone()));

        let service = ReservationService::new(repository.clone(), catalog.clone(), credentials.clone());
        let reserver = Arc::new(
            Reserver::new(repository.clone(), catalog, gateway, credentials.clone(), window)
                .with_tick_interval(config.tick_interval()),
        );

        tracing::debug!(
            base_url = %config.platform.base_url,
            studio_id = config.platform.studio_id,
            "Application assembled"
        );

        Self {
            config,
            repository,
            credentials,
            service,
            reserver,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::create_mock_repository;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        let result = App::from_config(config);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_with_repository_wires_credentials() {
        let mut config = Config::default();
        config.credentials.insert(
            "user@example.com".to_string(),
            crate::models::Credential {
                password: "pw".to_string(),
                payment_ref: "PMT".to_string(),
            },
        );

        let app = App::with_repository(config, create_mock_repository()).unwrap();
        assert!(app.credentials.contains("user@example.com"));
        assert_eq!(*app.reserver.window(), BookingWindow::default());
    }

    #[test]
    fn test_out_of_range_offset_is_an_error() {
        let mut config = Config::default();
        config.scheduler.utc_offset_hours = i32::MAX;
        let result = App::with_repository(config, create_mock_repository());
        assert!(matches!(result, Err(Error::Scheduler(_))));
    }

    #[test]
    fn test_from_config_opens_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.sqlite_path = dir.path().join("reservations.db");

        let app = App::from_config(config).unwrap();
        assert_eq!(app.repository.stats().unwrap().total, 0);
    }
}
