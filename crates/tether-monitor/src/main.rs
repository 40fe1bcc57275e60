//! Tether activity monitor
//!
//! Spins up a fleet of simulated connectors, each emitting on its own thread,
//! feeds them into one shared activity log and prints what the log retained.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::info;

use tether_activity::{ActivityLog, ActivityLogConfig};
use tether_core::{Connector, SimulatedConnector};
use tether_logging::{ConnectorContextGuard, LogConfig, TetherSubscriberBuilder};

#[derive(Parser)]
#[command(
    name = "tether-monitor",
    about = "Drive simulated connectors against a bounded activity log",
    version
)]
struct Cli {
    /// Number of simulated connectors
    #[arg(short, long, default_value = "4")]
    connectors: usize,

    /// Events emitted by each connector
    #[arg(short, long, default_value = "100")]
    events: usize,

    /// History capacity (overrides the config file)
    #[arg(long)]
    capacity: Option<usize>,

    /// Activity log configuration as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Human-readable logs instead of JSONL
    #[arg(long)]
    pretty: bool,

    /// Detach each connector halfway through its events
    #[arg(long)]
    detach_early: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(cli: &Cli) -> anyhow::Result<ActivityLogConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            ActivityLogConfig::from_json_str(&raw)?
        }
        None => ActivityLogConfig::default(),
    };
    if let Some(capacity) = cli.capacity {
        config = config.with_capacity(capacity);
    }
    Ok(config)
}

fn run_connector(
    log: Arc<ActivityLog>,
    connector: Arc<SimulatedConnector>,
    events: usize,
    detach_early: bool,
) {
    let _ctx = ConnectorContextGuard::new(&*connector);
    let mut guard = Some(log.track(Arc::clone(&connector)));

    connector.open_connection(format!("session-{}", connector.id().short_id()));
    for i in 0..events {
        if detach_early && i == events / 2 {
            if let Some(guard) = guard.take() {
                guard.release();
            }
            info!(emitted = i, "Detached early");
        }
        if i % 10 == 9 {
            connector.record_error(format!("poll {} failed", i), "timeout");
        } else {
            connector.record(format!("poll {}", i));
        }
    }
    connector.close_connection(format!("session-{}", connector.id().short_id()));
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries the JSON report; logs go to stderr
    let mut log_config = LogConfig::report_tool();
    if cli.pretty {
        log_config.console.pretty = true;
    }
    if cli.verbose {
        log_config.default_level = "debug".to_string();
        log_config.trace_records = true;
    }
    let _log_guard = TetherSubscriberBuilder::new().with_config(log_config).init();

    let config = load_config(&cli)?;
    let log = ActivityLog::new(config.clone())?;

    let delivered = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&delivered);
    let _counting = log.subscribe_fn("delivery-counter", move |_event| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let fleet = SimulatedConnector::fleet("sim", cli.connectors);
    let handles: Vec<_> = fleet
        .iter()
        .map(|connector| {
            let log = Arc::clone(&log);
            let connector = Arc::clone(connector);
            let (events, detach_early) = (cli.events, cli.detach_early);
            thread::spawn(move || run_connector(log, connector, events, detach_early))
        })
        .collect();

    for handle in handles {
        if handle.join().is_err() {
            anyhow::bail!("connector thread panicked");
        }
    }

    let emitted: u64 = fleet.iter().map(|c| c.emitted()).sum();
    info!(emitted, delivered = delivered.load(Ordering::Relaxed), "Fleet finished");

    let report = json!({
        "config": config,
        "connectors": fleet
            .iter()
            .map(|c| json!({ "id": c.id(), "name": c.name(), "emitted": c.emitted() }))
            .collect::<Vec<_>>(),
        "stats": log.stats(),
        "delivered": delivered.load(Ordering::Relaxed),
        "listener_faults": log.listener_faults(),
        "attached": log.attached_connectors().len(),
        "history": log.activity_history(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
