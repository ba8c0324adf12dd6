//! Dashboard API route handlers.
//!
//! All endpoints except `/` return JSON. State is shared via
//! `Arc<DashboardState>`.

use axum::{extract::State, http::StatusCode, response::Html, Json};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::report::html;
use crate::types::CycleReport;

/// Cycle summaries kept in memory.
const MAX_CYCLE_LOG: usize = 100;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub title: String,
    pub latest: RwLock<Option<CycleReport>>,
    pub cycle_log: RwLock<Vec<CycleLogEntry>>,
}

impl DashboardState {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            latest: RwLock::new(None),
            cycle_log: RwLock::new(Vec::new()),
        }
    }

    /// Store `report` as the latest and append its summary to the log.
    pub async fn record(&self, report: &CycleReport) {
        {
            let mut log = self.cycle_log.write().await;
            log.push(CycleLogEntry::from(report));
            let excess = log.len().saturating_sub(MAX_CYCLE_LOG);
            log.drain(..excess);
        }
        *self.latest.write().await = Some(report.clone());
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct CycleLogEntry {
    pub cycle_id: String,
    pub cycle_number: u64,
    pub timestamp: String,
    pub duration_ms: i64,
    pub items_requested: usize,
    pub items_priced: usize,
    pub resolution_failures: usize,
    pub collection_failures: usize,
    pub profitable: usize,
}

impl From<&CycleReport> for CycleLogEntry {
    fn from(r: &CycleReport) -> Self {
        Self {
            cycle_id: r.cycle_id.clone(),
            cycle_number: r.cycle_number,
            timestamp: r.finished_at.to_rfc3339(),
            duration_ms: r.duration().num_milliseconds(),
            items_requested: r.items_requested,
            items_priced: r.items_priced,
            resolution_failures: r.resolution_failures,
            collection_failures: r.collection_failures,
            profitable: r.profitable_count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub type AppState = Arc<DashboardState>;

/// GET /api/report
pub async fn get_report(State(state): State<AppState>) -> Result<Json<CycleReport>, StatusCode> {
    state
        .latest
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// GET /api/cycles
pub async fn get_cycles(State(state): State<AppState>) -> Json<Vec<CycleLogEntry>> {
    let log = state.cycle_log.read().await;
    Json(log.clone())
}

/// GET /
pub async fn get_page(State(state): State<AppState>) -> Html<String> {
    let latest = state.latest.read().await;
    Html(html::render_page(&state.title, latest.as_ref()))
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
