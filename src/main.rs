//! Bid Sniper - headless runner
//!
//! Loads the config and record file, runs one scheduling pass, then keeps
//! the process alive while armed bid timers count down. Ctrl-c cancels
//! whatever is still pending and closes every session.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use bidsniper::driver::{AutomationDriver, ChromeDriver};
use bidsniper::records::{JsonRecordStore, RecordStore};
use bidsniper::scheduler::DeadlineScheduler;
use bidsniper::SniperConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = bidsniper::init_logging();

    info!("Starting Bid Sniper");
    if let Some(dir) = bidsniper::log_dir() {
        info!("Log files saved to: {}", dir.display());
    }

    let config = SniperConfig::load();

    let store: Arc<dyn RecordStore> = match config.records_path {
        Some(ref path) => Arc::new(JsonRecordStore::new(path)),
        None => Arc::new(JsonRecordStore::at_default_path()?),
    };
    let driver: Arc<dyn AutomationDriver> = Arc::new(ChromeDriver::new(config.chrome.clone()));

    let scheduler = DeadlineScheduler::new(&config, driver, store);

    let auctions = scheduler.schedule_all().await?;
    let armed = scheduler.pending_count();
    info!(
        "Scheduling pass complete: {} auction(s) tracked, {} bid timer(s) armed",
        auctions.len(),
        armed
    );

    if armed > 0 {
        info!("Waiting for armed bids to fire (ctrl-c to cancel and exit)");
        loop {
            if scheduler.pending_count() == 0 {
                info!("All armed bids have fired");
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(1)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("{}", scheduler.cancel_all_pending());
                    break;
                }
            }
        }
    }

    info!("{}", scheduler.close_all_sessions().await);
    Ok(())
}
