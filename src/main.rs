/// BlueZone — Live Match Selector
///
/// Co dělá:
///   1. Každý tick stáhne snapshot live eventů (zápasy + predikce skóre)
///   2. Vybere nejzajímavější zápas, který právě začíná (hotness + hystereze)
///   3. Při změně přepne webcast virtuálního BlueZone eventu a uloží stav
///
/// Spuštění:
///   cargo run --bin bluezone            # periodicky
///   cargo run --bin bluezone -- --once  # jeden tick (cron)

mod state_db;

use anyhow::{bail, Result};
use chrono::Utc;
use dotenv::dotenv;
use live_feed::{DryRunPublisher, HttpFeedPublisher, HttpLiveEventSource, SnapshotEventSource};
use logger::{DailyTextLog, EventLogger};
use match_selector::{env_parse, BlueZone, FeedPublisher, LiveEventSource, SelectorConfig};
use state_db::SqliteStateStore;
use std::env;
use std::fs::File;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let once = env::args().any(|a| a == "--once");

    // Single instance lock - stav smí zapisovat jen jeden proces
    let lock_file_path = env::temp_dir().join("bluezone_selector.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of bluezone is already running! Exiting.");
            return Ok(());
        }
    };

    let cfg = SelectorConfig::from_env()?;
    let db_path = env::var("BLUEZONE_DB_PATH").unwrap_or_else(|_| "data/bluezone.db".to_string());
    let log_dir = env::var("BLUEZONE_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let tick_secs: u64 = env_parse("BLUEZONE_TICK_INTERVAL_SECS", 30);

    let source: Box<dyn LiveEventSource> = match (
        env::var("BLUEZONE_EVENTS_URL").ok(),
        env::var("BLUEZONE_EVENTS_FILE").ok(),
    ) {
        (Some(url), _) => {
            info!("Live events: {url}");
            Box::new(HttpLiveEventSource::new(url))
        }
        (None, Some(path)) => {
            info!("Live events snapshot: {path}");
            Box::new(SnapshotEventSource::new(path))
        }
        (None, None) => bail!("set BLUEZONE_EVENTS_URL or BLUEZONE_EVENTS_FILE"),
    };

    let publisher: Box<dyn FeedPublisher> = match env::var("BLUEZONE_PUBLISH_URL") {
        Ok(url) => {
            info!("Publishing to: {url}");
            Box::new(HttpFeedPublisher::new(url))
        }
        Err(_) => {
            info!("Mode: DRY RUN (BLUEZONE_PUBLISH_URL not set)");
            Box::new(DryRunPublisher)
        }
    };

    let store = SqliteStateStore::open(&db_path)?;
    if let Some(last) = store.history(1)?.first() {
        info!(
            "Last switch: {} → {} [{}], blacklisted: {}",
            last.ts, last.match_key, last.state_key, last.blacklist_size
        );
    }

    info!("=== BlueZone selector ===");
    info!(
        "Bucket: {}s, max per match: {}s, matches per event: {}",
        cfg.time_bucket.num_seconds(),
        cfg.max_time_per_match.num_seconds(),
        cfg.matches_per_event
    );
    info!("State: {db_path} [{}], logs: {log_dir}/", cfg.state_key);

    let zone = BlueZone::new(
        cfg,
        source,
        Box::new(store),
        publisher,
        Box::new(DailyTextLog::new(&log_dir, "bluezone")),
    )
    .with_event_logger(EventLogger::new(&log_dir));
    let tick_too_long = zone.config().tick_exceeds_bucket(tick_secs)?;

    if once {
        let report = zone.run_tick(Utc::now()).await?;
        info!("Tick outcome: {:?}", report.outcome);
        return Ok(());
    }

    // Anti-flicker má smysl jen když tickujeme aspoň jednou za TIME_BUCKET
    if tick_too_long {
        warn!(
            "Tick interval {}s is longer than time bucket {}s",
            tick_secs,
            zone.config().time_bucket.num_seconds()
        );
    }
    info!("🚀 READY: tick every {}s", tick_secs);

    loop {
        if let Err(e) = zone.run_tick(Utc::now()).await {
            error!("Tick failed: {e:#}");
        }

        tokio::select! {
            _ = sleep(Duration::from_secs(tick_secs)) => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C, shutting down.");
                return Ok(());
            }
        }
    }
}
