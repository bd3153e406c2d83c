//! classhold - deferred class reservations for studio booking platforms
//!
//! Users register the class they want ahead of time; a background loop
//! books it the moment the platform opens the slot.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`platform`] - Schedule and booking clients for the remote platform
//! - [`parser`] - Schedule page parsing
//! - [`models`] - Core data structures and types
//! - [`storage`] - Reservation store (SQLite)
//! - [`matcher`] - Pairing reservations with catalog slots
//! - [`scheduler`] - Booking window and the reservation loop
//! - [`service`] - Reservation submission and catalog queries
//! - [`server`] - HTTP API
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use classhold::app::App;
//! use classhold::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_config(Config::from_env()?)?;
//!     let outcome = app.reserver.run_cycle().await?;
//!     println!("{}", outcome.label());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod config;
pub mod credentials;
pub mod error;
pub mod matcher;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod platform;
pub mod scheduler;
pub mod server;
pub mod service;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::App;
    pub use crate::config::Config;
    pub use crate::credentials::{CredentialLookup, StaticCredentials};
    pub use crate::error::{ClassholdErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{ClassSlot, Credential, NewReservation, ReservationRequest, ReservationStatus};
    pub use crate::platform::{BookingGateway, CatalogSource};
    pub use crate::scheduler::{BookingWindow, CycleOutcome, CycleReport, Reserver};
    pub use crate::service::ReservationService;
    pub use crate::storage::ReservationRepository;
}

pub use models::{ClassSlot, NewReservation, ReservationRequest, ReservationStatus};
