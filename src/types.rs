//! Shared types for the SKINWATCH monitor.
//!
//! These types form the data model used across all modules. Platform
//! clients, the engine and the strategy layer all speak in terms of
//! item names, marketplace ids, price summaries and merged prices.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Marketplaces
// ---------------------------------------------------------------------------

/// A trading venue exposing sell-order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Buff,
    YouPin,
}

impl Marketplace {
    /// All known marketplaces, in report order.
    pub const ALL: &'static [Marketplace] = &[Marketplace::Buff, Marketplace::YouPin];

    /// Lowercase key used in config sections and log fields.
    pub fn key(&self) -> &'static str {
        match self {
            Marketplace::Buff => "buff",
            Marketplace::YouPin => "youpin",
        }
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marketplace::Buff => write!(f, "BUFF"),
            Marketplace::YouPin => write!(f, "YouPin"),
        }
    }
}

impl std::str::FromStr for Marketplace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buff" | "buff163" => Ok(Marketplace::Buff),
            "youpin" | "uu" | "youpin898" => Ok(Marketplace::YouPin),
            _ => Err(anyhow::anyhow!("Unknown marketplace: {s}")),
        }
    }
}

/// Opaque marketplace-assigned identifier for an item.
///
/// Numeric on both supported marketplaces, but only ever compared and
/// echoed back, so it is kept as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarketplaceId(pub String);

impl MarketplaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketplaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Price summary
// ---------------------------------------------------------------------------

/// Summary statistics over the sell-order prices seen for one item on one
/// marketplace during one collection pass.
///
/// The all-zero value means "resolved, but no active listings".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceSummary {
    pub max: Decimal,
    pub min: Decimal,
    pub mean: Decimal,
    pub median: Decimal,
}

impl PriceSummary {
    /// Summarize a price sequence.
    ///
    /// `mean` is rounded to 2 decimal places. `median` is the element at
    /// index `n / 2` of the ascending sequence; even-length inputs are not
    /// averaged.
    pub fn from_prices(prices: &[Decimal]) -> Self {
        if prices.is_empty() {
            return Self::default();
        }

        let mut sorted = prices.to_vec();
        sorted.sort();

        let sum: Decimal = sorted.iter().sum();
        let mean = (sum / Decimal::from(sorted.len())).round_dp(2);

        Self {
            max: sorted[sorted.len() - 1],
            min: sorted[0],
            mean,
            median: sorted[sorted.len() / 2],
        }
    }

    /// Whether this is the "no active listings" sentinel.
    pub fn is_empty(&self) -> bool {
        self.max.is_zero() && self.min.is_zero() && self.mean.is_zero() && self.median.is_zero()
    }
}

impl fmt::Display for PriceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no listings");
        }
        write!(
            f,
            "min={} max={} mean={} median={}",
            self.min, self.max, self.mean, self.median,
        )
    }
}

// ---------------------------------------------------------------------------
// Merged price
// ---------------------------------------------------------------------------

/// Lowest price for one item across all marketplaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedPrice {
    pub item: String,
    /// Minimum of the available marketplaces' `min`; `0` when none had data.
    pub lowest: Decimal,
}

impl MergedPrice {
    pub fn new(item: impl Into<String>, lowest: Decimal) -> Self {
        Self {
            item: item.into(),
            lowest,
        }
    }

    /// Whether there is a positive price to reason about.
    pub fn is_priced(&self) -> bool {
        self.lowest > Decimal::ZERO
    }
}

impl fmt::Display for MergedPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.item, self.lowest)
    }
}

// ---------------------------------------------------------------------------
// Trend
// ---------------------------------------------------------------------------

/// Direction of a period-over-period price change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Unchanged,
}

/// A current price rendered against the previous cycle's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrendDisplay {
    /// No history for this item yet.
    New { current: Decimal },
    /// Previous value was zero; no percentage is computed.
    Plain { current: Decimal },
    /// Dropped to zero from a positive previous value.
    NoStock,
    /// Percentage change against the previous value.
    Change {
        current: Decimal,
        pct: Decimal,
        direction: Direction,
    },
}

impl TrendDisplay {
    /// The current price carried by this display, zero for `NoStock`.
    pub fn current(&self) -> Decimal {
        match self {
            TrendDisplay::New { current }
            | TrendDisplay::Plain { current }
            | TrendDisplay::Change { current, .. } => *current,
            TrendDisplay::NoStock => Decimal::ZERO,
        }
    }

    pub fn pct(&self) -> Option<Decimal> {
        match self {
            TrendDisplay::Change { pct, .. } => Some(*pct),
            _ => None,
        }
    }

    pub fn direction(&self) -> Option<Direction> {
        match self {
            TrendDisplay::Change { direction, .. } => Some(*direction),
            _ => None,
        }
    }
}

impl fmt::Display for TrendDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDisplay::New { current } => write!(f, "{} (new)", current.normalize()),
            TrendDisplay::Plain { current } => write!(f, "{}", current.normalize()),
            TrendDisplay::NoStock => write!(f, "no stock"),
            TrendDisplay::Change {
                current,
                pct,
                direction,
            } => match direction {
                Direction::Up => write!(f, "{} (+{:.1}%)", current.normalize(), pct.round_dp(1)),
                Direction::Down => write!(f, "{} ({:.1}%)", current.normalize(), pct.round_dp(1)),
                Direction::Unchanged => write!(f, "{}", current.normalize()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

/// Profitability classification of one output item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rate", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    /// No evaluable margin (no listings, or no priced material).
    Normal,
    /// Margin above the profitability threshold.
    Profitable(Decimal),
    /// Margin computed but at or below the threshold.
    Info(Decimal),
}

impl VerdictStatus {
    pub fn rate(&self) -> Option<Decimal> {
        match self {
            VerdictStatus::Normal => None,
            VerdictStatus::Profitable(r) | VerdictStatus::Info(r) => Some(*r),
        }
    }

    pub fn is_profitable(&self) -> bool {
        matches!(self, VerdictStatus::Profitable(_))
    }
}

impl fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerdictStatus::Normal => write!(f, "NORMAL"),
            VerdictStatus::Profitable(r) => {
                write!(f, "PROFITABLE ({:.1}%)", (*r * Decimal::ONE_HUNDRED).round_dp(1))
            }
            VerdictStatus::Info(r) => {
                write!(f, "margin {:.1}%", (*r * Decimal::ONE_HUNDRED).round_dp(1))
            }
        }
    }
}

/// Arbitrage verdict for one output item. Recomputed every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArbitrageVerdict {
    pub item: String,
    pub trended_price: String,
    pub status: VerdictStatus,
}

/// Report entry for one material item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialVerdict {
    pub item: String,
    pub trended_price: String,
    /// Priced at exactly the cheapest positive material price.
    pub best: bool,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Which side of the crafting rule an item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Output,
    Material,
}

impl fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemCategory::Output => write!(f, "Output (A)"),
            ItemCategory::Material => write!(f, "Material (B)"),
        }
    }
}

/// One line of the cycle report handed to report sinks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub category: ItemCategory,
    pub item_name: String,
    pub display_price: String,
    pub status: String,
    /// Direction of the price change, when one was computed.
    #[serde(default)]
    pub trend: Option<Direction>,
    /// Profitable output, or cheapest material.
    #[serde(default)]
    pub flagged: bool,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | {} | {}",
            self.category, self.item_name, self.display_price, self.status,
        )
    }
}

/// One item's statistics on one marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub item_name: String,
    /// `None` when nothing was observed: unresolved id or failed collection.
    /// `Some` with all zeros means the item had no active listings.
    pub summary: Option<PriceSummary>,
    /// Why the item is absent, when it is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-marketplace statistics for every task item, in task order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceTable {
    pub marketplace: Marketplace,
    pub quotes: Vec<MarketQuote>,
}

impl MarketplaceTable {
    /// Items that produced a summary on this marketplace.
    pub fn observed(&self) -> usize {
        self.quotes.iter().filter(|q| q.summary.is_some()).count()
    }
}

/// Summary of a single collect → reconcile → evaluate cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle_id: String,
    pub cycle_number: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub items_requested: usize,
    /// Items with a positive merged price.
    pub items_priced: usize,
    /// `(marketplace, item)` lookups that ended in `ResolutionFailed`.
    pub resolution_failures: usize,
    /// Resolved lookups whose first page failed or timed out.
    #[serde(default)]
    pub collection_failures: usize,
    pub min_material_cost: Decimal,
    pub rows: Vec<ReportRow>,
    #[serde(default)]
    pub marketplaces: Vec<MarketplaceTable>,
}

impl CycleReport {
    /// Output rows currently classified as profitable.
    pub fn profitable_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.category == ItemCategory::Output && r.flagged)
            .count()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cycle #{}: items={} priced={} unresolved={} collect_failed={} best_material={} profitable={}",
            self.cycle_number,
            self.items_requested,
            self.items_priced,
            self.resolution_failures,
            self.collection_failures,
            self.min_material_cost,
            self.profitable_count(),
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SKINWATCH.
///
/// Item-level variants (`ResolutionFailed`, `CollectionTimeout`,
/// `Marketplace`) are absorbed by the engine and degrade a single item;
/// `TaskSource` aborts a cycle before any collection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    #[error("Could not resolve an identifier for '{item}' on {marketplace}")]
    ResolutionFailed { marketplace: Marketplace, item: String },

    #[error("Timed out fetching page {page} for {identifier} on {marketplace}")]
    CollectionTimeout {
        marketplace: Marketplace,
        identifier: String,
        page: u32,
    },

    #[error("Marketplace error ({marketplace}): {message}")]
    Marketplace { marketplace: Marketplace, message: String },

    #[error("Task source error: {0}")]
    TaskSource(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
