//! Prometheus metrics for the reservation loop and HTTP API
//!
//! This module provides metrics tracking for:
//! - Reserver: cycles by outcome, booking attempts by result, pending requests
//! - API: requests by endpoint and status, request duration
//!
//! # Usage
//!
//! Call `init_metrics()` at application startup to register all metrics.
//! If initialization fails, metrics operations become no-ops.

use prometheus::{
    register_counter_vec, register_gauge, register_histogram_vec, CounterVec, Encoder, Gauge,
    HistogramVec, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

/// Container for reservation loop metrics
struct ReserverMetrics {
    cycles: CounterVec,
    booking_attempts: CounterVec,
    pending_requests: Gauge,
    cycle_duration: HistogramVec,
}

/// Container for API metrics
struct ApiMetrics {
    requests: CounterVec,
    duration: HistogramVec,
}

static RESERVER_METRICS: OnceLock<ReserverMetrics> = OnceLock::new();

static API_METRICS: OnceLock<ApiMetrics> = OnceLock::new();

/// Flag to track if initialization was attempted
static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize all Prometheus metrics
///
/// Safe to call more than once; only the first call registers anything.
///
/// # Example
///
/// ```ignore
/// if let Err(e) = classhold::metrics::init_metrics() {
///     eprintln!("Warning: Metrics initialization failed: {}", e);
/// }
/// ```
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let reserver = ReserverMetrics {
        cycles: register_counter_vec!(
            "classhold_reserver_cycles_total",
            "Reservation cycles by outcome",
            &["outcome"]
        )?,
        booking_attempts: register_counter_vec!(
            "classhold_booking_attempts_total",
            "Booking attempts by result",
            &["result"]
        )?,
        pending_requests: register_gauge!(
            "classhold_pending_requests",
            "Pending requests for the current target date"
        )?,
        cycle_duration: register_histogram_vec!(
            "classhold_reserver_cycle_duration_seconds",
            "Time spent in one reservation cycle in seconds",
            &["outcome"],
            vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
        )?,
    };

    let api = ApiMetrics {
        requests: register_counter_vec!(
            "classhold_api_requests_total",
            "Total API requests by endpoint and status",
            &["endpoint", "status"]
        )?,
        duration: register_histogram_vec!(
            "classhold_api_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
        )?,
    };

    RESERVER_METRICS
        .set(reserver)
        .map_err(|_| "Reserver metrics already initialized")?;
    API_METRICS
        .set(api)
        .map_err(|_| "API metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Check if metrics have been initialized
pub fn metrics_initialized() -> bool {
    RESERVER_METRICS.get().is_some() && API_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Record a finished cycle
pub fn record_cycle(outcome: &str, duration_secs: f64) {
    let Some(m) = RESERVER_METRICS.get() else {
        return;
    };

    m.cycles.with_label_values(&[outcome]).inc();
    m.cycle_duration
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Record one booking attempt
pub fn record_booking_attempt(result: &str) {
    if let Some(m) = RESERVER_METRICS.get() {
        m.booking_attempts.with_label_values(&[result]).inc();
    }
}

/// Update the pending-requests gauge
pub fn set_pending_requests(count: usize) {
    if let Some(m) = RESERVER_METRICS.get() {
        m.pending_requests.set(count as f64);
    }
}

/// Record API request
pub fn record_api_request(endpoint: &str, status: u16, duration_secs: f64) {
    let Some(m) = API_METRICS.get() else {
        return;
    };

    let status_str = status.to_string();
    m.requests
        .with_label_values(&[endpoint, &status_str])
        .inc();
    m.duration
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
        // Idempotent
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_encode_metrics() {
        ensure_metrics_initialized();
        record_cycle("completed", 0.2);
        let text = encode_metrics().unwrap();
        assert!(text.contains("classhold_reserver_cycles_total"));
    }

    #[test]
    fn test_reserver_metrics() {
        ensure_metrics_initialized();
        record_booking_attempt("booked");
        record_booking_attempt("closed");
        set_pending_requests(3);
        assert!(metrics_initialized());
    }

    #[test]
    fn test_api_request_recording() {
        ensure_metrics_initialized();
        record_api_request("/classes", 200, 0.005);
    }

    #[test]
    fn test_metrics_noop_without_init() {
        // Must not panic whether or not another test initialized first
        record_cycle("gated", 0.0);
        record_booking_attempt("auth_failed");
        set_pending_requests(0);
        record_api_request("/test", 200, 0.001);
    }
}
