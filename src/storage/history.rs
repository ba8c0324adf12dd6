//! Price history store.
//!
//! Holds the previous cycle's merged lowest price per item. Read once at
//! the start of trend computation and overwritten wholesale once at the
//! end of the cycle; there are no partial updates.

use anyhow::Result;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::types::MergedPrice;

/// Persisted `item → lowest` mapping from the previous cycle.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous cycle's prices. Missing or corrupt ⇒ empty.
    pub fn load(&self) -> BTreeMap<String, Decimal> {
        super::load_map(&self.path)
    }

    /// Replace the persisted history with `prices`.
    pub fn save(&self, prices: &BTreeMap<String, Decimal>) -> Result<()> {
        super::save_json(prices, &self.path)?;
        info!(path = %self.path.display(), items = prices.len(), "Price history saved");
        Ok(())
    }

    /// Replace the persisted history with this cycle's merged prices.
    pub fn save_merged(&self, merged: &[MergedPrice]) -> Result<()> {
        let map: BTreeMap<String, Decimal> = merged
            .iter()
            .map(|m| (m.item.clone(), m.lowest))
            .collect();
        self.save(&map)
    }
}
