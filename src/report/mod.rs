//! Cycle reports and the sinks they are published to.
//!
//! A sink receives the finished `CycleReport` of every cycle. Sinks are
//! independent: one failing never stops the others or the cycle itself.

pub mod html;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::storage;
use crate::strategy::{Evaluation, Trended};
use crate::tasks::TaskList;
use crate::types::{CycleReport, ItemCategory, ReportRow};

/// Status text of the cheapest material row(s).
pub const BEST_MATERIAL: &str = "BEST MATERIAL";

/// Build report rows in task order: outputs first, then materials.
pub fn build_rows(
    tasks: &TaskList,
    outputs: &[Trended],
    materials: &[Trended],
    evaluation: &Evaluation,
) -> Vec<ReportRow> {
    let output_rows = outputs.iter().zip(&evaluation.outputs).map(|(t, v)| ReportRow {
        category: ItemCategory::Output,
        item_name: tasks.display_name(&v.item, ItemCategory::Output),
        display_price: v.trended_price.clone(),
        status: v.status.to_string(),
        trend: t.trend.direction(),
        flagged: v.status.is_profitable(),
    });

    let material_rows = materials.iter().zip(&evaluation.materials).map(|(t, v)| ReportRow {
        category: ItemCategory::Material,
        item_name: tasks.display_name(&v.item, ItemCategory::Material),
        display_price: v.trended_price.clone(),
        status: if v.best { BEST_MATERIAL.to_string() } else { "-".to_string() },
        trend: t.trend.direction(),
        flagged: v.best,
    });

    output_rows.chain(material_rows).collect()
}

/// Destination for finished cycle reports.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, report: &CycleReport) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Writes every row through `tracing`.
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn publish(&self, report: &CycleReport) -> Result<()> {
        info!(cycle_id = %report.cycle_id, "{report}");
        for row in &report.rows {
            if row.flagged && row.category == ItemCategory::Output {
                warn!(cycle = report.cycle_number, "{row}");
            } else {
                info!(cycle = report.cycle_number, "{row}");
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Keeps the latest report on disk as pretty JSON.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    async fn publish(&self, report: &CycleReport) -> Result<()> {
        storage::save_json(report, &self.path)
    }

    fn name(&self) -> &str {
        "json-file"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
