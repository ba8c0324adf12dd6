//! Period-over-period trend computation.
//!
//! Compares each item's merged lowest price against the value persisted by
//! the previous cycle and produces a displayable delta.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::types::{Direction, MergedPrice, TrendDisplay};

/// A merged price paired with its trend against the previous cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trended {
    pub price: MergedPrice,
    pub trend: TrendDisplay,
}

impl Trended {
    pub fn lowest(&self) -> Decimal {
        self.price.lowest
    }
}

/// Render `current` against `previous`.
///
/// - no history → `New`
/// - previous was zero → plain value, no percentage
/// - dropped to zero → `NoStock` (never shown as -100%)
/// - otherwise percentage change, direction from its sign
pub fn trend(current: Decimal, previous: Option<Decimal>) -> TrendDisplay {
    let previous = match previous {
        None => return TrendDisplay::New { current },
        Some(p) => p,
    };

    if previous.is_zero() {
        return TrendDisplay::Plain { current };
    }
    if current.is_zero() {
        return TrendDisplay::NoStock;
    }

    let pct = (current - previous) / previous * Decimal::ONE_HUNDRED;
    let direction = if pct > Decimal::ZERO {
        Direction::Up
    } else if pct < Decimal::ZERO {
        Direction::Down
    } else {
        Direction::Unchanged
    };

    TrendDisplay::Change {
        current,
        pct,
        direction,
    }
}

/// Attach trends to a batch of merged prices using the loaded history.
pub fn apply_trends(prices: &[MergedPrice], history: &BTreeMap<String, Decimal>) -> Vec<Trended> {
    prices
        .iter()
        .map(|p| Trended {
            trend: trend(p.lowest, history.get(&p.item).copied()),
            price: p.clone(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
