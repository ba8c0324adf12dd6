//! Cross-market reconciliation.
//!
//! Merges per-marketplace summaries into one lowest-price view per item.
//! A marketplace that never resolved the item contributes nothing; a
//! marketplace that resolved it but saw no listings contributes its
//! all-zero summary.

use rust_decimal::Decimal;
use tracing::{debug, info};

use super::session::QuoteBook;
use crate::types::{MergedPrice, PriceSummary};

/// Merge two optional summaries for `item`.
pub fn merge(item: &str, a: Option<&PriceSummary>, b: Option<&PriceSummary>) -> MergedPrice {
    merge_all(item, [a, b])
}

/// Merge any number of optional summaries. Absent entries act as +∞;
/// all absent gives `0`.
pub fn merge_all<'a, I>(item: &str, summaries: I) -> MergedPrice
where
    I: IntoIterator<Item = Option<&'a PriceSummary>>,
{
    let lowest = summaries
        .into_iter()
        .flatten()
        .map(|s| s.min)
        .min()
        .unwrap_or(Decimal::ZERO);
    MergedPrice::new(item, lowest)
}

/// Merge every requested item across all quote books, preserving `items`
/// order. A book missing entirely (marketplace disabled or down) simply
/// contributes nothing.
pub fn reconcile(items: &[String], books: &[QuoteBook]) -> Vec<MergedPrice> {
    let merged: Vec<MergedPrice> = items
        .iter()
        .map(|item| {
            let m = merge_all(item, books.iter().map(|b| b.summary(item)));
            debug!(item = %item, lowest = %m.lowest, "Merged");
            m
        })
        .collect();

    info!(
        items = merged.len(),
        priced = merged.iter().filter(|m| m.is_priced()).count(),
        marketplaces = books.len(),
        "Reconciliation complete"
    );

    merged
}
