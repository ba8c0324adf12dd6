//! Dashboard: Axum web server for the latest cycle report.
//!
//! Serves a small JSON API and an HTML rendering of the latest report.
//! CORS enabled for local development.

pub mod routes;

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::report::ReportSink;
use crate::types::CycleReport;
pub use routes::{AppState, DashboardState};

/// Bind the dashboard port and serve in a background task.
pub async fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind dashboard port {port}"))?;
    info!(port, "Dashboard server starting on http://localhost:{port}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "Dashboard server error");
        }
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/report", get(routes::get_report))
        .route("/api/cycles", get(routes::get_cycles))
        .route("/health", get(routes::health))
        .route("/", get(routes::get_page))
        .layer(cors)
        .with_state(state)
}

/// Report sink feeding the dashboard state.
pub struct DashboardSink {
    state: AppState,
}

impl DashboardSink {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl ReportSink for DashboardSink {
    async fn publish(&self, report: &CycleReport) -> Result<()> {
        self.state.record(report).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "dashboard"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
