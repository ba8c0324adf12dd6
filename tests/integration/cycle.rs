//! End-to-end cycle tests against mock marketplaces.

use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::time::Duration;

use skinwatch::engine::collector::PriceCollector;
use skinwatch::engine::resolver::IdentifierCache;
use skinwatch::engine::session::MarketSession;
use skinwatch::engine::Monitor;
use skinwatch::report::{JsonFileSink, BEST_MATERIAL};
use skinwatch::storage::HistoryStore;
use skinwatch::strategy::{ArbitrageConfig, ArbitrageEvaluator};
use skinwatch::types::{CycleReport, Direction, ItemCategory, Marketplace, MonitorError};

use crate::mock_marketplace::MockMarketplace;

const SUFFIX: &str = " (Field-Tested)";
const KARAMBIT: &str = "Karambit (Field-Tested)";

/// Scratch files for one test, removed on drop.
struct Scratch {
    dir: PathBuf,
}

impl Scratch {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("skinwatch_it_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn write_tasks(&self, body: &str) -> PathBuf {
        let path = self.path("tasks.toml");
        std::fs::write(&path, body).unwrap();
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

fn session(mock: MockMarketplace, scratch: &Scratch, page_timeout: Duration) -> MarketSession {
    let marketplace = skinwatch::platforms::MarketplaceClient::marketplace(&mock);
    let cache = IdentifierCache::load(marketplace, scratch.path(&format!("{}_ids.json", marketplace.key())));
    MarketSession::new(
        Box::new(mock),
        cache,
        Duration::from_secs(2),
        PriceCollector::new(2, page_timeout, Duration::ZERO),
    )
}

fn monitor(scratch: &Scratch, tasks: PathBuf, sessions: Vec<MarketSession>) -> Monitor {
    Monitor::new(
        tasks,
        SUFFIX,
        sessions,
        HistoryStore::new(scratch.path("history.json")),
        ArbitrageEvaluator::new(ArbitrageConfig::default()),
    )
}

const TASKS: &str = r#"
outputs   = ["Karambit"]
materials = ["Case A", "Case B"]
"#;

fn buff_full() -> MockMarketplace {
    MockMarketplace::new(Marketplace::Buff)
        .with_pages(KARAMBIT, "101", vec![vec![dec!(110), dec!(100)], vec![dec!(120)]])
        .with_item("Case A", "201", &[dec!(9), dec!(8)])
        .with_item("Case B", "202", &[dec!(12)])
}

fn youpin_partial() -> MockMarketplace {
    MockMarketplace::new(Marketplace::YouPin)
        .with_item(KARAMBIT, "9001", &[dec!(95), dec!(90)])
        .with_item("Case B", "9002", &[dec!(13)])
}

fn row<'a>(report: &'a CycleReport, name: &str) -> &'a skinwatch::types::ReportRow {
    report.rows.iter().find(|r| r.item_name == name).unwrap()
}

#[tokio::test]
async fn test_full_cycle_flags_profitable_craft() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks(TASKS);
    let buff = buff_full();
    let youpin = youpin_partial();
    let buff_calls = buff.calls();

    let mut monitor = monitor(
        &scratch,
        tasks,
        vec![
            session(buff, &scratch, Duration::from_secs(2)),
            session(youpin, &scratch, Duration::from_secs(2)),
        ],
    );
    monitor.add_sink(Box::new(JsonFileSink::new(scratch.path("report.json"))));

    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.items_requested, 3);
    assert_eq!(report.items_priced, 3);
    // Case A is not listed on YouPin
    assert_eq!(report.resolution_failures, 1);
    assert_eq!(report.min_material_cost, dec!(8));

    let karambit = row(&report, "Karambit");
    assert_eq!(karambit.category, ItemCategory::Output);
    assert_eq!(karambit.display_price, "90 (new)");
    assert_eq!(karambit.status, "PROFITABLE (55.6%)");
    assert!(karambit.flagged);

    assert_eq!(row(&report, "Case A").status, BEST_MATERIAL);
    assert_eq!(row(&report, "Case B").status, "-");
    assert_eq!(report.profitable_count(), 1);

    // Two pages per item: none of the first pages is empty.
    assert_eq!(buff_calls.searches(), 3);
    assert_eq!(buff_calls.pages(), 6);

    let buff_ids = IdentifierCache::load(Marketplace::Buff, scratch.path("buff_ids.json"));
    assert_eq!(buff_ids.get(KARAMBIT).unwrap().as_str(), "101");
    let youpin_ids = IdentifierCache::load(Marketplace::YouPin, scratch.path("youpin_ids.json"));
    assert!(youpin_ids.get("Case A").is_none());

    let written: CycleReport =
        serde_json::from_str(&std::fs::read_to_string(scratch.path("report.json")).unwrap()).unwrap();
    assert_eq!(written.cycle_id, report.cycle_id);

    // Per-marketplace statistics, BUFF first, items in task order.
    assert_eq!(written.marketplaces.len(), 2);
    let buff_table = &written.marketplaces[0];
    assert_eq!(buff_table.marketplace, Marketplace::Buff);
    let karambit_buff = buff_table.quotes[0].summary.unwrap();
    assert_eq!(buff_table.quotes[0].item_name, KARAMBIT);
    assert_eq!(karambit_buff.max, dec!(120));
    assert_eq!(karambit_buff.min, dec!(100));
    assert_eq!(karambit_buff.mean, dec!(110));
    assert_eq!(karambit_buff.median, dec!(110));
    let youpin_table = &written.marketplaces[1];
    assert_eq!(youpin_table.marketplace, Marketplace::YouPin);
    assert!(youpin_table.quotes[1].summary.is_none());
    assert!(youpin_table.quotes[1].error.is_some());
    assert_eq!(youpin_table.quotes[2].summary.unwrap().min, dec!(13));
}

#[tokio::test]
async fn test_second_cycle_uses_cache_and_history() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks(TASKS);

    let mut first = monitor(
        &scratch,
        tasks.clone(),
        vec![session(buff_full(), &scratch, Duration::from_secs(2))],
    );
    first.run_cycle().await.unwrap();

    let buff = MockMarketplace::new(Marketplace::Buff)
        .with_item(KARAMBIT, "101", &[dec!(110)])
        .with_item("Case A", "201", &[dec!(8)])
        .with_item("Case B", "202", &[]);
    let calls = buff.calls();
    let mut second = monitor(&scratch, tasks, vec![session(buff, &scratch, Duration::from_secs(2))]);
    let report = second.run_cycle().await.unwrap();

    assert_eq!(calls.searches(), 0, "ids come from the persisted cache");

    let karambit = row(&report, "Karambit");
    assert_eq!(karambit.display_price, "110 (+10.0%)");
    assert_eq!(karambit.trend, Some(Direction::Up));

    assert_eq!(row(&report, "Case A").display_price, "8");
    assert_eq!(row(&report, "Case B").display_price, "no stock");

    let history = HistoryStore::new(scratch.path("history.json")).load();
    assert_eq!(history[KARAMBIT], dec!(110));
    assert_eq!(history["Case B"], dec!(0));
}

#[tokio::test]
async fn test_one_marketplace_down_keeps_the_other() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks(TASKS);
    let youpin = youpin_partial().failing("HTTP 503");
    let youpin_calls = youpin.calls();

    let mut monitor = monitor(
        &scratch,
        tasks,
        vec![
            session(buff_full(), &scratch, Duration::from_secs(2)),
            session(youpin, &scratch, Duration::from_secs(2)),
        ],
    );
    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.resolution_failures, 3);
    assert_eq!(youpin_calls.pages(), 0);
    // BUFF alone: 100 against 5 × 8 = 60%
    assert_eq!(row(&report, "Karambit").status, "PROFITABLE (60.0%)");
    assert_eq!(report.items_priced, 3);
}

#[tokio::test]
async fn test_cached_ids_with_marketplace_down_keep_other_prices() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks(TASKS);

    let mut first = monitor(
        &scratch,
        tasks.clone(),
        vec![
            session(buff_full(), &scratch, Duration::from_secs(2)),
            session(youpin_partial(), &scratch, Duration::from_secs(2)),
        ],
    );
    first.run_cycle().await.unwrap();

    // Karambit and Case B ids are cached for YouPin, so only pages fail.
    let youpin = youpin_partial().failing("HTTP 503");
    let youpin_calls = youpin.calls();
    let mut second = monitor(
        &scratch,
        tasks,
        vec![
            session(buff_full(), &scratch, Duration::from_secs(2)),
            session(youpin, &scratch, Duration::from_secs(2)),
        ],
    );
    let report = second.run_cycle().await.unwrap();

    assert_eq!(youpin_calls.searches(), 1, "only uncached Case A is searched");
    assert_eq!(youpin_calls.pages(), 2);
    assert_eq!(report.resolution_failures, 1);
    assert_eq!(report.collection_failures, 2);
    assert_eq!(report.items_priced, 3);
    assert_eq!(report.min_material_cost, dec!(8));

    let karambit = row(&report, "Karambit");
    assert_eq!(karambit.display_price, "100 (+11.1%)");
    assert_eq!(karambit.status, "PROFITABLE (60.0%)");
    assert_eq!(row(&report, "Case B").display_price, "12");

    let youpin_table = &report.marketplaces[1];
    assert_eq!(youpin_table.observed(), 0);
    assert!(youpin_table.quotes[0].error.as_deref().unwrap().contains("HTTP 503"));

    let history = HistoryStore::new(scratch.path("history.json")).load();
    assert_eq!(history[KARAMBIT], dec!(100));
    assert_eq!(history["Case B"], dec!(12));
}

#[tokio::test]
async fn test_page_timeout_leaves_item_unpriced() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks(TASKS);
    let slow = buff_full().with_page_delay(Duration::from_millis(300));

    let mut monitor = monitor(
        &scratch,
        tasks,
        vec![session(slow, &scratch, Duration::from_millis(30))],
    );
    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(report.items_priced, 0);
    assert_eq!(report.resolution_failures, 0);
    assert_eq!(report.collection_failures, 3);
    assert!(report.marketplaces[0].quotes.iter().all(|q| q.summary.is_none()));
    assert_eq!(report.min_material_cost, dec!(0));
    assert_eq!(row(&report, "Karambit").status, "NORMAL");
    assert!(report.rows.iter().all(|r| !r.flagged));
}

#[tokio::test]
async fn test_empty_first_page_skips_second() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks("materials = [\"Case A\"]\n");
    let buff = MockMarketplace::new(Marketplace::Buff).with_pages(
        "Case A",
        "201",
        vec![vec![], vec![dec!(5)]],
    );
    let calls = buff.calls();

    let mut monitor = monitor(&scratch, tasks, vec![session(buff, &scratch, Duration::from_secs(2))]);
    let report = monitor.run_cycle().await.unwrap();

    assert_eq!(calls.pages(), 1);
    assert_eq!(row(&report, "Case A").display_price, "0 (new)");
}

#[tokio::test]
async fn test_empty_task_list_aborts_without_calls() {
    let scratch = Scratch::new();
    let tasks = scratch.write_tasks("outputs = []\nmaterials = [\"  \"]\n");
    let buff = buff_full();
    let calls = buff.calls();

    let mut monitor = monitor(&scratch, tasks, vec![session(buff, &scratch, Duration::from_secs(2))]);
    let err = monitor.run_cycle().await.unwrap_err();

    assert!(matches!(err, MonitorError::TaskSource(_)));
    assert_eq!(calls.searches(), 0);
    assert_eq!(calls.pages(), 0);
    assert!(!scratch.path("history.json").exists());
}
