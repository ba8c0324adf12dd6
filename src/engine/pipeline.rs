//! The collect → reconcile → trend → evaluate cycle.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::collector::PriceCollector;
use super::reconciler::reconcile;
use super::resolver::IdentifierCache;
use super::session::{MarketSession, QuoteBook};
use crate::config::AppConfig;
use crate::platforms::buff::BuffClient;
use crate::platforms::youpin::YouPinClient;
use crate::platforms::MarketplaceClient;
use crate::report::{build_rows, ReportSink};
use crate::storage::HistoryStore;
use crate::strategy::{apply_trends, ArbitrageConfig, ArbitrageEvaluator, Trended};
use crate::tasks::TaskList;
use crate::types::{CycleReport, Marketplace, MonitorError};

/// Ticker for the cycle loop. The first tick fires immediately. A cycle
/// that overruns the period pushes the next one back instead of firing
/// the missed ticks in a burst.
pub fn cycle_interval(period: Duration) -> tokio::time::Interval {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval
}

/// Owns every marketplace session and runs cycles on demand.
pub struct Monitor {
    task_file: PathBuf,
    wear_suffix: String,
    sessions: Vec<MarketSession>,
    history: HistoryStore,
    evaluator: ArbitrageEvaluator,
    sinks: Vec<Box<dyn ReportSink>>,
    cycle_count: u64,
}

impl Monitor {
    pub fn new(
        task_file: impl Into<PathBuf>,
        wear_suffix: impl Into<String>,
        sessions: Vec<MarketSession>,
        history: HistoryStore,
        evaluator: ArbitrageEvaluator,
    ) -> Self {
        Self {
            task_file: task_file.into(),
            wear_suffix: wear_suffix.into(),
            sessions,
            history,
            evaluator,
            sinks: Vec::new(),
            cycle_count: 0,
        }
    }

    /// Build a monitor with a live HTTP client for every enabled marketplace.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let collector_for = |m: Marketplace| {
            PriceCollector::new(
                cfg.monitor.page_limit,
                cfg.marketplaces.get(m).page_timeout(),
                Duration::from_millis(cfg.monitor.page_delay_ms),
            )
        };

        let mut sessions = Vec::new();
        for marketplace in cfg.enabled_marketplaces() {
            let mc = cfg.marketplaces.get(marketplace);
            let cookie = mc.cookie();
            if mc.cookie_env.is_some() && cookie.is_none() {
                warn!(%marketplace, "Session cookie not set, requests may be rejected");
            }

            let client: Box<dyn MarketplaceClient> = match marketplace {
                Marketplace::Buff => Box::new(BuffClient::new(&mc.base_url, cookie)?),
                Marketplace::YouPin => Box::new(YouPinClient::new(&mc.base_url, cookie)?),
            };
            let cache = IdentifierCache::load(marketplace, &mc.cache_file);
            sessions.push(MarketSession::new(
                client,
                cache,
                mc.search_timeout(),
                collector_for(marketplace),
            ));
        }

        if sessions.is_empty() {
            warn!("No marketplace enabled, every item will be unpriced");
        }

        let evaluator = ArbitrageEvaluator::new(
            ArbitrageConfig::from_settings(&cfg.strategy).context("Invalid strategy settings")?,
        );

        Ok(Self::new(
            &cfg.monitor.task_file,
            &cfg.tasks.output_wear_suffix,
            sessions,
            HistoryStore::new(&cfg.monitor.history_file),
            evaluator,
        ))
    }

    pub fn add_sink(&mut self, sink: Box<dyn ReportSink>) {
        self.sinks.push(sink);
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn marketplaces(&self) -> Vec<Marketplace> {
        self.sessions.iter().map(MarketSession::marketplace).collect()
    }

    /// Load the task file and run one cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, MonitorError> {
        let tasks = TaskList::load(&self.task_file, &self.wear_suffix)?;
        self.run_cycle_with(&tasks).await
    }

    /// Run one cycle over an already-loaded task list.
    pub async fn run_cycle_with(&mut self, tasks: &TaskList) -> Result<CycleReport, MonitorError> {
        if tasks.is_empty() {
            return Err(MonitorError::TaskSource("task list contains no items".into()));
        }

        let cycle_number = self.cycle_count + 1;
        let started_at = Utc::now();
        let items = tasks.all_items();
        info!(cycle = cycle_number, items = items.len(), "Starting cycle");

        // 1. Collect: sequential per marketplace, marketplaces side by side
        let books: Vec<QuoteBook> = futures::future::join_all(
            self.sessions.iter_mut().map(|s| s.collect_all(&items)),
        )
        .await;
        let resolution_failures: usize = books.iter().map(QuoteBook::resolution_failures).sum();
        let collection_failures: usize = books.iter().map(QuoteBook::collection_failures).sum();
        let marketplaces = books.iter().map(|b| b.table(&items)).collect();

        // 2. Reconcile and trend
        let merged = reconcile(&items, &books);
        let previous = self.history.load();
        let trended: HashMap<String, Trended> = apply_trends(&merged, &previous)
            .into_iter()
            .map(|t| (t.price.item.clone(), t))
            .collect();
        let pick = |names: &[String]| -> Vec<Trended> {
            names.iter().filter_map(|n| trended.get(n).cloned()).collect()
        };
        let outputs = pick(&tasks.outputs);
        let materials = pick(&tasks.materials);

        // 3. Evaluate
        let evaluation = self.evaluator.evaluate(&outputs, &materials);
        let rows = build_rows(tasks, &outputs, &materials, &evaluation);

        // 4. Overwrite history for the next cycle
        if let Err(e) = self.history.save_merged(&merged) {
            let err = MonitorError::Storage(format!("{}: {e:#}", self.history.path().display()));
            warn!(error = %err, "Price history not saved, previous history kept");
        }

        self.cycle_count = cycle_number;
        let report = CycleReport {
            cycle_id: uuid::Uuid::new_v4().to_string(),
            cycle_number,
            started_at,
            finished_at: Utc::now(),
            items_requested: items.len(),
            items_priced: merged.iter().filter(|m| m.is_priced()).count(),
            resolution_failures,
            collection_failures,
            min_material_cost: evaluation.min_material_cost,
            rows,
            marketplaces,
        };

        // 5. Publish
        for sink in &self.sinks {
            if let Err(e) = sink.publish(&report).await {
                warn!(sink = sink.name(), error = %e, "Report sink failed");
            }
        }

        info!(
            cycle = cycle_number,
            duration_ms = report.duration().num_milliseconds(),
            priced = report.items_priced,
            profitable = report.profitable_count(),
            "Cycle complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::MockMarketplaceClient;
    use crate::storage::delete_file;
    use crate::storage::tests::temp_path;
    use crate::types::{ItemCategory, MarketplaceId};
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    struct FailingSink;

    #[async_trait]
    impl ReportSink for FailingSink {
        async fn publish(&self, _report: &CycleReport) -> Result<()> {
            anyhow::bail!("disk full")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct CapturingSink(Arc<Mutex<Vec<u64>>>);

    #[async_trait]
    impl ReportSink for CapturingSink {
        async fn publish(&self, report: &CycleReport) -> Result<()> {
            self.0.lock().unwrap().push(report.cycle_number);
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn priced_client(marketplace: Marketplace, prices: Vec<(&'static str, Decimal)>) -> MockMarketplaceClient {
        let listed: Vec<&'static str> = prices.iter().map(|(name, _)| *name).collect();
        let mut client = MockMarketplaceClient::new();
        client.expect_marketplace().return_const(marketplace);
        client.expect_search_for_identifier().returning(move |name| {
            if listed.iter().any(|l| *l == name) {
                Ok(MarketplaceId::new(name))
            } else {
                Err(anyhow::anyhow!("no search result for {name}"))
            }
        });
        client.expect_fetch_sell_order_page().returning(move |id, _| {
            Ok(prices
                .iter()
                .filter(|(name, _)| *name == id.as_str())
                .map(|(_, p)| *p)
                .collect())
        });
        client
    }

    fn session(client: MockMarketplaceClient, cache: &PathBuf) -> MarketSession {
        let marketplace = client.marketplace();
        MarketSession::new(
            Box::new(client),
            IdentifierCache::load(marketplace, cache),
            Duration::from_secs(5),
            PriceCollector::new(1, Duration::from_secs(5), Duration::ZERO),
        )
    }

    #[tokio::test]
    async fn test_cycle_merges_marketplaces_and_flags_profit() {
        let buff_cache = temp_path("pipe_buff");
        let youpin_cache = temp_path("pipe_youpin");
        let history = temp_path("pipe_history");

        let buff = priced_client(
            Marketplace::Buff,
            vec![("Karambit (Field-Tested)", dec!(100)), ("Case A", dec!(8))],
        );
        let youpin = priced_client(
            Marketplace::YouPin,
            vec![("Karambit (Field-Tested)", dec!(90)), ("Case B", dec!(12))],
        );

        let mut monitor = Monitor::new(
            "unused.toml",
            " (Field-Tested)",
            vec![session(buff, &buff_cache), session(youpin, &youpin_cache)],
            HistoryStore::new(&history),
            ArbitrageEvaluator::new(ArbitrageConfig::default()),
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        monitor.add_sink(Box::new(FailingSink));
        monitor.add_sink(Box::new(CapturingSink(seen.clone())));

        let tasks = TaskList::new(&["Karambit"], &["Case A", "Case B"], " (Field-Tested)").unwrap();
        let report = monitor.run_cycle_with(&tasks).await.unwrap();

        assert_eq!(report.cycle_number, 1);
        assert_eq!(report.items_requested, 3);
        assert_eq!(report.items_priced, 3);
        assert_eq!(report.resolution_failures, 2);
        assert_eq!(report.collection_failures, 0);
        assert_eq!(report.min_material_cost, dec!(8));
        assert_eq!(report.rows[0].category, ItemCategory::Output);
        assert_eq!(report.rows[0].item_name, "Karambit");
        assert_eq!(report.rows[0].status, "PROFITABLE (55.6%)");
        assert_eq!(report.profitable_count(), 1);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(monitor.cycle_count(), 1);

        assert_eq!(report.marketplaces.len(), 2);
        let buff_table = &report.marketplaces[0];
        assert_eq!(buff_table.marketplace, Marketplace::Buff);
        assert_eq!(buff_table.quotes[0].summary.unwrap().min, dec!(100));
        assert_eq!(buff_table.quotes[1].summary.unwrap().min, dec!(8));
        assert!(buff_table.quotes[2].summary.is_none());
        assert_eq!(report.marketplaces[1].observed(), 2);

        let saved = HistoryStore::new(&history).load();
        assert_eq!(saved["Karambit (Field-Tested)"], dec!(90));

        for p in [buff_cache, youpin_cache, history] {
            delete_file(&p).unwrap();
        }
    }

    #[tokio::test]
    async fn test_cycle_interval_delays_after_overrun() {
        let interval = cycle_interval(Duration::from_secs(60));
        assert_eq!(interval.period(), Duration::from_secs(60));
        assert_eq!(
            interval.missed_tick_behavior(),
            tokio::time::MissedTickBehavior::Delay
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cycle_interval_does_not_burst() {
        let mut interval = cycle_interval(Duration::from_secs(10));
        interval.tick().await;
        let start = tokio::time::Instant::now();

        // A cycle that takes 35s covers three missed periods.
        tokio::time::advance(Duration::from_secs(35)).await;
        interval.tick().await;
        interval.tick().await;

        assert!(tokio::time::Instant::now() - start >= Duration::from_secs(45));
    }

    #[tokio::test]
    async fn test_missing_task_file_aborts_before_collection() {
        let mut client = MockMarketplaceClient::new();
        client.expect_marketplace().return_const(Marketplace::Buff);
        client.expect_search_for_identifier().times(0);
        client.expect_fetch_sell_order_page().times(0);

        let mut monitor = Monitor::new(
            "/tmp/skinwatch_missing_tasks.toml",
            " (Field-Tested)",
            vec![session(client, &temp_path("pipe_none"))],
            HistoryStore::new(temp_path("pipe_none_history")),
            ArbitrageEvaluator::new(ArbitrageConfig::default()),
        );

        let err = monitor.run_cycle().await.unwrap_err();
        assert!(matches!(err, MonitorError::TaskSource(_)));
        assert_eq!(monitor.cycle_count(), 0);
    }
}
