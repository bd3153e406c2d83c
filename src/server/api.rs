//! REST API handlers
//!
//! This module defines the API routes and handlers for the reservation
//! service.

use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::metrics;
use crate::models::NewReservation;
use crate::scheduler::ReserverStatus;
use crate::service::ServiceError;
use crate::storage::ReservationStats;

use super::AppState;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

/// Simple error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Accepted reservation
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: i64,
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservations: Option<ReservationStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserver: Option<ReserverStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ClassesQuery {
    pub date: Option<String>,
}

// ============================================================================
// API Routes
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/classes", get(get_classes).post(submit_reservation))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

/// Client mistakes are 400; everything else, unknown users included, is 500
fn service_error_status(err: &ServiceError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let reservations = match state.service.stats() {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read reservation stats");
            None
        }
    };

    let reserver = match &state.reserver {
        Some(reserver) => Some(reserver.status().await),
        None => None,
    };

    Json(ApiResponse::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        reservations,
        reserver,
    }))
}

/// Live class catalog for a date
async fn get_classes(
    State(state): State<AppState>,
    Query(query): Query<ClassesQuery>,
) -> Response {
    let started = Instant::now();

    let response = match query.date {
        None => error_response(StatusCode::BAD_REQUEST, "date not found"),
        Some(date) => match state.service.classes(&date).await {
            Ok(slots) => (StatusCode::OK, Json(slots)).into_response(),
            Err(e) => {
                tracing::warn!(date = %date, error = %e, "Catalog request failed");
                error_response(service_error_status(&e), e.to_string())
            }
        },
    };

    metrics::record_api_request(
        "GET /classes",
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Submit a reservation intent
async fn submit_reservation(
    State(state): State<AppState>,
    payload: Result<Json<NewReservation>, JsonRejection>,
) -> Response {
    let started = Instant::now();

    let response = match payload {
        Err(rejection) => error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
        Ok(Json(reservation)) => match state.service.submit(reservation) {
            Ok(id) => (StatusCode::OK, Json(SubmitResponse { success: true, id })).into_response(),
            Err(e) => error_response(service_error_status(&e), e.to_string()),
        },
    };

    metrics::record_api_request(
        "POST /classes",
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

/// Prometheus scrape endpoint
async fn metrics_endpoint() -> Response {
    match metrics::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
