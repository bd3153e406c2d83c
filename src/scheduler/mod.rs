//! Deferred reservation scheduling
//!
//! # Modules
//!
//! - [`window`] - Time-of-day gate and booking lead time
//! - [`reserver`] - The periodic reservation loop
//! - [`error`] - Scheduler errors
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use classhold::scheduler::{BookingWindow, Reserver};
//!
//! let reserver = Reserver::new(repo, catalog, gateway, credentials, BookingWindow::default());
//! let outcome = reserver.run_cycle().await?;
//! ```

pub mod error;
pub mod reserver;
pub mod window;

pub use error::{SchedulerError, SchedulerResult};
pub use reserver::{CycleOutcome, CyclePhase, CycleReport, Reserver, ReserverStatus};
pub use window::BookingWindow;
