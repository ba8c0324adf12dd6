//! Crafting arbitrage rule.
//!
//! An output item is crafted from `conversion_ratio` units of material.
//! Using the cheapest positively-priced material as the cost basis, the
//! margin of an output item is `(price - cost) / price`; margins above the
//! threshold are flagged profitable.

use anyhow::Result;
use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use super::trend::Trended;
use crate::config::StrategyConfig;
use crate::types::{ArbitrageVerdict, MaterialVerdict, MonitorError, VerdictStatus};

// ---------------------------------------------------------------------------
// Configuration (defaults, overridden by config.toml at runtime)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrageConfig {
    /// Material units consumed per output unit.
    pub conversion_ratio: Decimal,
    /// Margin strictly above this is `PROFITABLE`.
    pub profit_threshold: Decimal,
}

impl Default for ArbitrageConfig {
    fn default() -> Self {
        Self {
            conversion_ratio: dec!(5),
            profit_threshold: dec!(0.15),
        }
    }
}

impl ArbitrageConfig {
    /// Convert the float settings from `config.toml`.
    pub fn from_settings(settings: &StrategyConfig) -> Result<Self> {
        Ok(Self {
            conversion_ratio: to_decimal("conversion_ratio", settings.conversion_ratio)?,
            profit_threshold: to_decimal("profit_threshold", settings.profit_threshold)?,
        })
    }
}

/// Parse through the shortest decimal string so `0.15` stays exactly `0.15`.
fn to_decimal(field: &str, value: f64) -> Result<Decimal> {
    Decimal::from_str(&value.to_string())
        .map_err(|_| MonitorError::Config(format!("{field} {value} is not representable")).into())
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Verdicts for one cycle.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Cheapest positive material price, `0` when no material is priced.
    pub min_material_cost: Decimal,
    pub outputs: Vec<ArbitrageVerdict>,
    pub materials: Vec<MaterialVerdict>,
}

impl Evaluation {
    pub fn profitable(&self) -> impl Iterator<Item = &ArbitrageVerdict> {
        self.outputs.iter().filter(|v| v.status.is_profitable())
    }
}

pub struct ArbitrageEvaluator {
    config: ArbitrageConfig,
}

impl ArbitrageEvaluator {
    pub fn new(config: ArbitrageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ArbitrageConfig {
        &self.config
    }

    /// Cheapest material with a positive price, or zero.
    pub fn min_material_cost(materials: &[Trended]) -> Decimal {
        materials
            .iter()
            .map(Trended::lowest)
            .filter(|p| *p > Decimal::ZERO)
            .min()
            .unwrap_or(Decimal::ZERO)
    }

    /// Classify one output price against the material cost basis.
    pub fn classify(&self, output_price: Decimal, min_material_cost: Decimal) -> VerdictStatus {
        if output_price <= Decimal::ZERO || min_material_cost <= Decimal::ZERO {
            return VerdictStatus::Normal;
        }

        let cost = min_material_cost * self.config.conversion_ratio;
        let rate = (output_price - cost) / output_price;

        if rate > self.config.profit_threshold {
            VerdictStatus::Profitable(rate)
        } else {
            VerdictStatus::Info(rate)
        }
    }

    /// Evaluate every output item and flag the cheapest material(s).
    ///
    /// Ties at the minimum material price are all flagged best.
    pub fn evaluate(&self, outputs: &[Trended], materials: &[Trended]) -> Evaluation {
        let min_material_cost = Self::min_material_cost(materials);

        let output_verdicts: Vec<ArbitrageVerdict> = outputs
            .iter()
            .map(|o| {
                let status = self.classify(o.lowest(), min_material_cost);
                if let Some(rate) = status.rate() {
                    debug!(
                        item = %o.price.item,
                        price = %o.lowest(),
                        cost = %(min_material_cost * self.config.conversion_ratio),
                        rate = format!("{:.1}%", rate * dec!(100)),
                        "Margin computed"
                    );
                }
                ArbitrageVerdict {
                    item: o.price.item.clone(),
                    trended_price: o.trend.to_string(),
                    status,
                }
            })
            .collect();

        let material_verdicts = materials
            .iter()
            .map(|m| MaterialVerdict {
                item: m.price.item.clone(),
                trended_price: m.trend.to_string(),
                best: m.lowest() > Decimal::ZERO && m.lowest() == min_material_cost,
            })
            .collect();

        let evaluation = Evaluation {
            min_material_cost,
            outputs: output_verdicts,
            materials: material_verdicts,
        };

        info!(
            outputs = evaluation.outputs.len(),
            materials = evaluation.materials.len(),
            min_material_cost = %min_material_cost,
            profitable = evaluation.profitable().count(),
            "Arbitrage evaluation complete"
        );

        evaluation
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
