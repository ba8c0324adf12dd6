//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (marketplace session cookies) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::types::{Marketplace, MonitorError};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    pub marketplaces: MarketplacesConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    pub name: String,
    pub cycle_interval_secs: u64,
    /// Sell-order pages fetched per item per marketplace.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Pause between consecutive page fetches of one item.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    pub task_file: String,
    pub history_file: String,
    /// Latest report is written here as JSON, if set.
    #[serde(default)]
    pub report_file: Option<String>,
}

fn default_page_limit() -> u32 {
    2
}

fn default_page_delay_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize, Clone)]
pub struct TasksConfig {
    /// Wear condition appended to every output item name.
    pub output_wear_suffix: String,
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            output_wear_suffix: " (Field-Tested)".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StrategyConfig {
    /// Material units consumed per output unit.
    pub conversion_ratio: f64,
    /// Minimum margin (fraction of output price) to call a craft profitable.
    pub profit_threshold: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            conversion_ratio: 5.0,
            profit_threshold: 0.15,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplacesConfig {
    pub buff: MarketplaceConfig,
    pub youpin: MarketplaceConfig,
}

impl MarketplacesConfig {
    pub fn get(&self, marketplace: Marketplace) -> &MarketplaceConfig {
        match marketplace {
            Marketplace::Buff => &self.buff,
            Marketplace::YouPin => &self.youpin,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketplaceConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Persistent name → id cache for this marketplace.
    pub cache_file: String,
    /// Env var holding the session cookie, if the marketplace needs one.
    #[serde(default)]
    pub cookie_env: Option<String>,
    pub search_timeout_secs: u64,
    pub page_timeout_secs: u64,
}

impl MarketplaceConfig {
    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    /// Session cookie from the configured env var, if present and non-empty.
    pub fn cookie(&self) -> Option<String> {
        self.cookie_env
            .as_deref()
            .and_then(|env| AppConfig::resolve_env(env).ok())
            .filter(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.monitor.page_limit == 0 {
            return Err(MonitorError::Config("monitor.page_limit must be at least 1".into()));
        }
        let ratio = self.strategy.conversion_ratio;
        if ratio <= 0.0 || !ratio.is_finite() {
            return Err(MonitorError::Config(format!(
                "strategy.conversion_ratio must be a positive number, got {ratio}"
            )));
        }
        if !(0.0..1.0).contains(&self.strategy.profit_threshold) {
            return Err(MonitorError::Config(
                "strategy.profit_threshold must be in [0, 1)".into(),
            ));
        }
        for m in Marketplace::ALL {
            let mc = self.marketplaces.get(*m);
            if mc.enabled && (mc.search_timeout_secs == 0 || mc.page_timeout_secs == 0) {
                return Err(MonitorError::Config(format!(
                    "marketplaces.{}: timeouts must be non-zero",
                    m.key()
                )));
            }
        }
        Ok(())
    }

    /// Marketplaces switched on in config, in report order.
    pub fn enabled_marketplaces(&self) -> Vec<Marketplace> {
        Marketplace::ALL
            .iter()
            .copied()
            .filter(|m| self.marketplaces.get(*m).enabled)
            .collect()
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
