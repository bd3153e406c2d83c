//! Reservation persistence
//!
//! Requests are kept in SQLite; see [`repository`] for the store trait and
//! its implementations.

pub mod repository;

pub use repository::{
    create_mock_repository, create_sqlite_repository, MockReservationRepository,
    ReservationRepository, ReservationStats, SharedReservationRepository,
    SqliteReservationRepository, StoreError, StoreResult,
};

use crate::config::DatabaseConfig;

/// Open the configured reservation store
pub fn open_repository(config: &DatabaseConfig) -> StoreResult<SharedReservationRepository> {
    create_sqlite_repository(&config.sqlite_path)
}
