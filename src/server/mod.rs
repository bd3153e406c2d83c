//! HTTP API server
//!
//! Serves the reservation endpoints and, when given a [`Reserver`], runs
//! the reservation loop alongside the listener.

pub mod api;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::scheduler::Reserver;
use crate::service::ReservationService;

pub use api::create_router;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: ReservationService,

    /// Reservation loop, if this process runs one
    pub reserver: Option<Arc<Reserver>>,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: ReservationService) -> Self {
        Self {
            service,
            reserver: None,
            start_time: Instant::now(),
        }
    }

    #[must_use]
    pub fn with_reserver(mut self, reserver: Arc<Reserver>) -> Self {
        self.reserver = Some(reserver);
        self
    }
}

// ============================================================================
// API Server
// ============================================================================

pub struct ApiServer {
    config: ServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    pub fn bind_address(&self) -> SocketAddr {
        self.config.bind_address
    }

    /// Serve until `shutdown_signal` resolves
    ///
    /// The reservation loop, if any, starts only after the listener is bound
    /// and is stopped once the listener has drained.
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        tracing::info!(%addr, "API server listening");

        let loop_handle = self.state.reserver.clone().map(|reserver| {
            tokio::spawn(async move {
                if let Err(e) = reserver.start().await {
                    tracing::error!(error = %e, "Reserver loop exited with error");
                }
            })
        });

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()));

        if let Some(reserver) = &self.state.reserver {
            reserver.stop();
        }
        if let Some(handle) = loop_handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Reserver task panicked");
            }
        }

        tracing::info!("API server shutdown complete");
        served
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}
