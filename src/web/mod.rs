//! Web layer module
//!
//! HTTP surface for the exporter: liveness, readiness, and the Prometheus
//! scrape endpoint. Handlers are thin reads over the shared `MetricsState`;
//! nothing here writes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::metrics::MetricsState;

pub mod handlers;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<MetricsState>,
    pub config: Config,
}

/// Web server configuration and setup
pub struct WebServer {
    app: Router,
    listener: tokio::net::TcpListener,
}

impl WebServer {
    /// Bind the metrics port and build the router
    ///
    /// Binding happens here so a port conflict is reported as a fatal error
    /// before the poller is considered started.
    pub async fn bind(config: Config, metrics: Arc<MetricsState>) -> AppResult<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(AppError::ServerBind)?;

        let app = Self::create_router(AppState { metrics, config });
        Ok(Self { app, listener })
    }

    /// Create the router with all routes and middleware
    pub fn create_router(state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(handlers::liveness))
            .route("/ready", get(handlers::readiness))
            .route("/metrics", get(handlers::metrics))
            .fallback(handlers::not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// The bound port (useful when binding port 0 in tests)
    pub fn port(&self) -> AppResult<u16> {
        Ok(self.listener.local_addr().map_err(AppError::ServerBind)?.port())
    }

    /// Serve until the shutdown token is cancelled
    ///
    /// Cancellation stops the listener from accepting new connections;
    /// in-flight requests are allowed to complete.
    pub async fn serve(self, shutdown: CancellationToken) -> AppResult<()> {
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(AppError::ServerBind)?;
        Ok(())
    }
}
