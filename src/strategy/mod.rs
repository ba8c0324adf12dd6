//! Strategy layer: trend computation and the crafting arbitrage rule.
//!
//! Both stages are pure: they take merged prices (and the previous cycle's
//! history) and return display values and verdicts. Nothing here touches
//! the network or the filesystem.

pub mod arbitrage;
pub mod trend;

pub use arbitrage::{ArbitrageConfig, ArbitrageEvaluator, Evaluation};
pub use trend::{apply_trends, trend, Trended};
