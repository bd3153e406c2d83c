//! Deferred reservation loop
//!
//! Every tick the reserver checks the booking window, loads the pending
//! requests for the date that just opened, fetches that date's catalog once
//! and tries each request in store order. Requests only leave the pending
//! set after a confirmed booking; every other outcome is retried on the
//! next tick.
//!
//! Cycles run inline in the loop task, so a slow cycle delays the next tick
//! instead of overlapping it, and missed ticks are skipped rather than
//! replayed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

use crate::credentials::SharedCredentialLookup;
use crate::matcher::{find_bookable, MatchError};
use crate::metrics;
use crate::models::{ClassSlot, ReservationRequest};
use crate::platform::{BookingGateway, CatalogSource};
use crate::scheduler::error::{SchedulerError, SchedulerResult};
use crate::scheduler::window::BookingWindow;
use crate::storage::SharedReservationRepository;
use crate::utils::error::BookingError;

/// Default tick interval
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(2);

/// What the reserver is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePhase {
    Idle,
    Gated,
    Fetching,
    Matching,
    Booking,
    Settling,
}

/// Tally of one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub target_date: String,
    /// Pending requests loaded for the target date
    pub pending: usize,
    /// Requests booked and marked done
    pub booked: usize,
    /// Requests with no bookable slot in the catalog
    pub unmatched: usize,
    /// Requests whose booking attempt failed
    pub failed: usize,
}

/// How a cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Outside the booking window
    Gated { local_hour: u32 },
    /// Nothing pending for the target date
    Idle { target_date: String },
    /// The catalog could not be fetched; nothing was attempted
    FetchFailed { target_date: String, reason: String },
    /// Every pending request was attempted
    Completed(CycleReport),
}

impl CycleOutcome {
    /// Metric label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Gated { .. } => "gated",
            Self::Idle { .. } => "idle",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::Completed(_) => "completed",
        }
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of one request within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptResult {
    Booked,
    Unmatched,
    Failed,
}

/// Snapshot of the reserver for status reporting
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserverStatus {
    pub running: bool,
    pub phase: CyclePhase,
    pub cycles: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub last_report: Option<CycleReport>,
}

#[derive(Debug)]
struct ReserverState {
    running: bool,
    phase: CyclePhase,
    cycles: u64,
    last_cycle_at: Option<DateTime<Utc>>,
    last_report: Option<CycleReport>,
}

impl Default for ReserverState {
    fn default() -> Self {
        Self {
            running: false,
            phase: CyclePhase::Idle,
            cycles: 0,
            last_cycle_at: None,
            last_report: None,
        }
    }
}

/// The reservation loop
pub struct Reserver {
    repository: SharedReservationRepository,
    catalog: Arc<dyn CatalogSource>,
    gateway: Arc<dyn BookingGateway>,
    credentials: SharedCredentialLookup,
    window: BookingWindow,
    tick_interval: Duration,
    state: Arc<RwLock<ReserverState>>,
    shutdown: watch::Sender<bool>,
}

impl Reserver {
    pub fn new(
        repository: SharedReservationRepository,
        catalog: Arc<dyn CatalogSource>,
        gateway: Arc<dyn BookingGateway>,
        credentials: SharedCredentialLookup,
        window: BookingWindow,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            repository,
            catalog,
            gateway,
            credentials,
            window,
            tick_interval: DEFAULT_TICK_INTERVAL,
            state: Arc::new(RwLock::new(ReserverState::default())),
            shutdown,
        }
    }

    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn window(&self) -> &BookingWindow {
        &self.window
    }

    /// Run one cycle against the wall clock
    pub async fn run_cycle(&self) -> SchedulerResult<CycleOutcome> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle as if the current time were `now`
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::StoreError` if pending requests cannot be
    /// loaded. Remote failures never surface here; they end the cycle or
    /// the single attempt and are logged.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> SchedulerResult<CycleOutcome> {
        let started = Instant::now();
        let result = self.cycle(now).await;
        self.set_phase(CyclePhase::Idle).await;

        if let Ok(outcome) = &result {
            metrics::record_cycle(outcome.label(), started.elapsed().as_secs_f64());

            let mut state = self.state.write().await;
            state.cycles += 1;
            state.last_cycle_at = Some(now);
            if let Some(report) = outcome.report() {
                state.last_report = Some(report.clone());
            }
        }

        result
    }

    async fn cycle(&self, now: DateTime<Utc>) -> SchedulerResult<CycleOutcome> {
        if !self.window.is_open(now) {
            self.set_phase(CyclePhase::Gated).await;
            let local_hour = chrono::Timelike::hour(&self.window.local(now));
            tracing::trace!(local_hour, "Outside booking window");
            return Ok(CycleOutcome::Gated { local_hour });
        }

        let target_date = self.window.target_date_string(now);
        let pending = self
            .repository
            .list_pending(&target_date)
            .map_err(|e| SchedulerError::store("list_pending", e))?;
        metrics::set_pending_requests(pending.len());

        if pending.is_empty() {
            tracing::trace!(date = %target_date, "No pending reservations");
            return Ok(CycleOutcome::Idle { target_date });
        }

        self.set_phase(CyclePhase::Fetching).await;
        let slots = match self.catalog.fetch_catalog(&target_date).await {
            Ok(slots) => slots,
            Err(e) => {
                tracing::warn!(date = %target_date, error = %e, "Catalog fetch failed");
                return Ok(CycleOutcome::FetchFailed {
                    target_date,
                    reason: e.to_string(),
                });
            }
        };

        let mut report = CycleReport {
            target_date,
            pending: pending.len(),
            ..Default::default()
        };

        for request in &pending {
            match self.attempt(request, &slots).await {
                AttemptResult::Booked => report.booked += 1,
                AttemptResult::Unmatched => report.unmatched += 1,
                AttemptResult::Failed => report.failed += 1,
            }
        }

        tracing::info!(
            date = %report.target_date,
            pending = report.pending,
            booked = report.booked,
            unmatched = report.unmatched,
            failed = report.failed,
            "Reservation cycle finished"
        );
        Ok(CycleOutcome::Completed(report))
    }

    /// Try to book one request; never more than one submission
    async fn attempt(&self, request: &ReservationRequest, slots: &[ClassSlot]) -> AttemptResult {
        self.set_phase(CyclePhase::Matching).await;
        let slot = match find_bookable(request, slots) {
            Ok(slot) => slot,
            Err(MatchError::NotFound) => {
                tracing::debug!(id = request.id, request = %request, "No catalog slot for request");
                return AttemptResult::Unmatched;
            }
            Err(MatchError::NotBookable) => {
                tracing::debug!(id = request.id, request = %request, "Slot not open for booking yet");
                return AttemptResult::Unmatched;
            }
        };

        let Some(credential) = self.credentials.lookup(&request.email) else {
            tracing::warn!(id = request.id, email = %request.email, "No credentials for user");
            metrics::record_booking_attempt("unknown_user");
            self.record_failure(request.id, "user not exists");
            return AttemptResult::Failed;
        };

        self.set_phase(CyclePhase::Booking).await;
        let session = match self.gateway.authenticate(&request.email, &credential).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(id = request.id, email = %request.email, error = %e, "Login failed");
                metrics::record_booking_attempt("auth_failed");
                self.record_failure(request.id, &e.to_string());
                return AttemptResult::Failed;
            }
        };

        if let Err(e) = self
            .gateway
            .submit_booking(&session, &request.date, &slot.id, &credential)
            .await
        {
            let result = match e {
                BookingError::Closed { .. } => "closed",
                _ => "rejected",
            };
            tracing::warn!(
                id = request.id,
                booking_id = %slot.id,
                error = %e,
                "Booking attempt failed"
            );
            metrics::record_booking_attempt(result);
            self.record_failure(request.id, &e.to_string());
            return AttemptResult::Failed;
        }

        self.set_phase(CyclePhase::Settling).await;
        metrics::record_booking_attempt("booked");
        match self.repository.mark_done(request.id) {
            Ok(()) => {
                tracing::info!(
                    id = request.id,
                    email = %request.email,
                    date = %request.date,
                    time = %request.time,
                    booking_id = %slot.id,
                    "Class booked"
                );
                AttemptResult::Booked
            }
            Err(e) => {
                // The platform accepted the booking; the request stays pending
                tracing::error!(id = request.id, error = %e, "Booked but failed to mark done");
                AttemptResult::Failed
            }
        }
    }

    fn record_failure(&self, id: i64, reason: &str) {
        if let Err(e) = self.repository.record_failure(id, reason) {
            tracing::warn!(id, error = %e, "Failed to record booking failure");
        }
    }

    async fn set_phase(&self, phase: CyclePhase) {
        self.state.write().await.phase = phase;
    }

    /// Start the tick loop; returns once `stop` is called
    ///
    /// A `stop` issued before the loop starts is honoured. Once the loop
    /// has stopped it can be started again.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidTickInterval` for a zero tick and
    /// `SchedulerError::AlreadyRunning` if the loop is active.
    pub async fn start(&self) -> SchedulerResult<()> {
        if self.tick_interval.is_zero() {
            return Err(SchedulerError::InvalidTickInterval);
        }

        {
            let mut state = self.state.write().await;
            if state.running {
                return Err(SchedulerError::AlreadyRunning);
            }
            state.running = true;
        }

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            tick_secs = self.tick_interval.as_secs_f64(),
            "Reserver loop started"
        );

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        tracing::error!(error = %e, "Reservation cycle failed");
                    }
                }
                _ = shutdown_rx.changed() => {}
            }
        }

        self.shutdown.send_replace(false);
        self.state.write().await.running = false;
        tracing::info!("Reserver loop stopped");
        Ok(())
    }

    /// Ask the loop to stop after the current cycle
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub async fn status(&self) -> ReserverStatus {
        let state = self.state.read().await;
        ReserverStatus {
            running: state.running,
            phase: state.phase,
            cycles: state.cycles,
            last_cycle_at: state.last_cycle_at,
            last_report: state.last_report.clone(),
        }
    }
}
