//! SKINWATCH: cross-marketplace skin price monitor.
//!
//! Entry point. Loads configuration, initialises structured logging, wires
//! the report sinks and runs one cycle immediately, then one per interval,
//! until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use skinwatch::config;
use skinwatch::dashboard::{self, DashboardSink, DashboardState};
use skinwatch::engine::{cycle_interval, Monitor};
use skinwatch::report::{JsonFileSink, LogSink};

const BANNER: &str = r#"
 ____  _  _____ _   ___        ___  _____ ____ _   _
/ ___|| |/ /_ _| \ | \ \      / / \|_   _/ ___| | | |
\___ \| ' / | ||  \| |\ \ /\ / / _ \ | || |   | |_| |
 ___) | . \ | || |\  | \ V  V / ___ \| || |___|  _  |
|____/|_|\_\___|_| \_|  \_/\_/_/   \_\_| \____|_| |_|

  Cross-marketplace price monitor & crafting arbitrage scanner
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = config::AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        name = %cfg.monitor.name,
        cycle_interval_secs = cfg.monitor.cycle_interval_secs,
        task_file = %cfg.monitor.task_file,
        "SKINWATCH starting up"
    );

    // -- Initialise components -------------------------------------------

    let mut monitor = Monitor::from_config(&cfg)?;
    info!(marketplaces = ?monitor.marketplaces(), "Marketplace sessions ready");
    monitor.add_sink(Box::new(LogSink));

    if let Some(path) = &cfg.monitor.report_file {
        monitor.add_sink(Box::new(JsonFileSink::new(path)));
    }

    if cfg.dashboard.enabled {
        let state = Arc::new(DashboardState::new(cfg.monitor.name.clone()));
        dashboard::spawn_dashboard(state.clone(), cfg.dashboard.port).await?;
        monitor.add_sink(Box::new(DashboardSink::new(state)));
    }

    // -- Main loop -------------------------------------------------------

    let mut interval = cycle_interval(Duration::from_secs(cfg.monitor.cycle_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.monitor.cycle_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match monitor.run_cycle().await {
                    Ok(report) => info!(
                        cycle = report.cycle_number,
                        profitable = report.profitable_count(),
                        "Report published"
                    ),
                    Err(e) => error!(error = %e, "Cycle failed, continuing to next"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!(cycles = monitor.cycle_count(), "SKINWATCH shut down cleanly.");
    Ok(())
}

/// Initialise the tracing subscriber. `RUST_LOG` overrides the default
/// filter; `SKINWATCH_LOG_JSON` switches to JSON lines.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("skinwatch=info"));

    if std::env::var("SKINWATCH_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
