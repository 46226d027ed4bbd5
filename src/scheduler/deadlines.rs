//! Deadline scheduler
//!
//! A scheduling pass groups pending auctions by owning account, opens (or
//! reuses) one session per account, logs in once, then fires overdue bids
//! immediately and arms one timer per future deadline. Accounts proceed
//! concurrently; auctions within one account share a single session and
//! run sequentially.
//!
//! Every previously armed timer is cancelled before a pass computes new
//! ones, so at most one timer exists per auction at any time.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::bid::BidExecutor;
use crate::driver::AutomationDriver;
use crate::login::LoginController;
use crate::records::{Account, Auction, RecordStore, StoreError};
use crate::session::{SessionRegistry, VenueSession};
use crate::SniperConfig;

/// Scheduling errors that reach the caller. Per-account and per-auction
/// failures never do; they are logged where they occur.
#[derive(Error, Debug)]
pub enum SniperError {
    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

/// One armed timer for a not-yet-due bid.
pub struct ScheduledBid {
    pub auction_id: i64,
    pub account_username: String,
    handle: JoinHandle<()>,
}

/// The orchestrator over registry, login controller and bid executor.
pub struct DeadlineScheduler {
    registry: Arc<SessionRegistry>,
    login: Arc<LoginController>,
    executor: Arc<BidExecutor>,
    store: Arc<dyn RecordStore>,
    pending: Arc<Mutex<Vec<ScheduledBid>>>,
}

impl DeadlineScheduler {
    pub fn new(
        config: &SniperConfig,
        driver: Arc<dyn AutomationDriver>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(driver)),
            login: Arc::new(LoginController::new(config)),
            executor: Arc::new(BidExecutor::new(config, store.clone())),
            store,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of armed, not-yet-fired bid timers.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub async fn session_count(&self) -> usize {
        self.registry.session_count().await
    }

    /// Run one scheduling pass over every account and tracked auction.
    ///
    /// Returns once immediate bids have run and every future one is armed;
    /// armed bids keep firing asynchronously after this returns. The caller
    /// always gets the (possibly partially updated) auction collection --
    /// bid failures are logged, never raised.
    pub async fn schedule_all(&self) -> Result<Vec<Auction>, SniperError> {
        let cancelled = self.cancel_pending();
        if cancelled > 0 {
            debug!("Cancelled {} previously armed timer(s) before rescheduling", cancelled);
        }

        let (accounts, auctions) = self.store.load().await?;
        if accounts.is_empty() || auctions.is_empty() {
            info!(
                "Nothing to schedule ({} accounts, {} auctions)",
                accounts.len(),
                auctions.len()
            );
            return Ok(auctions);
        }

        let mut tasks = Vec::new();
        for account in accounts {
            // Auctions with no owning account are dropped here; zero-value
            // ones are filtered before any session or login cost.
            let eligible: Vec<Auction> = auctions
                .iter()
                .filter(|a| a.account_username == account.username && a.is_eligible())
                .cloned()
                .collect();

            if eligible.is_empty() {
                debug!("Account {} has no eligible auctions, skipping", account.username);
                continue;
            }

            let registry = self.registry.clone();
            let login = self.login.clone();
            let executor = self.executor.clone();
            let pending = self.pending.clone();
            tasks.push(tokio::spawn(async move {
                schedule_account(registry, login, executor, pending, account, eligible).await;
            }));
        }

        for result in join_all(tasks).await {
            if let Err(e) = result {
                error!("Account scheduling task panicked: {}", e);
            }
        }

        Ok(self.store.load().await?.1)
    }

    /// Cancel every armed timer. Sessions and their authentication state
    /// are untouched.
    pub fn cancel_all_pending(&self) -> String {
        let count = self.cancel_pending();
        let message = format!("Cancelled {} pending bid(s)", count);
        info!("{}", message);
        message
    }

    /// Close every session and clear the registry. Armed timers are left in
    /// place: one that fires later drives a closed page and fails as a
    /// normal interaction failure.
    pub async fn close_all_sessions(&self) -> String {
        let count = self.registry.close_all().await;

        let armed = self.pending_count();
        if armed > 0 {
            warn!("{} bid timer(s) still armed after closing sessions", armed);
        }

        format!("Closed {} session(s)", count)
    }

    fn cancel_pending(&self) -> usize {
        let mut pending = self.pending.lock();
        let count = pending.len();
        for bid in pending.drain(..) {
            debug!(
                "Cancelling armed bid for auction {} (account {})",
                bid.auction_id, bid.account_username
            );
            bid.handle.abort();
        }
        count
    }
}

/// Per-account scheduling: one session, one login, then each eligible
/// auction classified as immediate or armed. All failures stay local to
/// this account.
async fn schedule_account(
    registry: Arc<SessionRegistry>,
    login: Arc<LoginController>,
    executor: Arc<BidExecutor>,
    pending: Arc<Mutex<Vec<ScheduledBid>>>,
    account: Account,
    eligible: Vec<Auction>,
) {
    let session = match registry.acquire(&account.username).await {
        Ok(session) => session,
        Err(e) => {
            error!("Could not open session for account {}: {}", account.username, e);
            return;
        }
    };

    login.ensure_authenticated(&session, &account).await;

    for auction in eligible {
        let Some(deadline) = auction.deadline else {
            info!("Auction {} has no deadline, skipped", auction.id);
            continue;
        };

        match (deadline - Utc::now()).to_std() {
            Ok(wait) if !wait.is_zero() => {
                debug!("Arming bid for auction {} in {:?}", auction.id, wait);

                let auction_id = auction.id;
                let session = session.clone();
                let executor = executor.clone();
                let pending_entry = pending.clone();
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(wait).await;
                    // Fired: drop out of the pending set before the attempt
                    // so cancellation can no longer reach this bid.
                    pending_entry.lock().retain(|b| b.auction_id != auction_id);
                    attempt_bid(&executor, &session, &auction).await;
                });

                pending.lock().push(ScheduledBid {
                    auction_id,
                    account_username: account.username.clone(),
                    handle,
                });
            }
            _ => {
                debug!("Deadline for auction {} already passed, bidding now", auction.id);
                attempt_bid(&executor, &session, &auction).await;
            }
        }
    }
}

/// One bid attempt. Failures are logged and never propagate to sibling
/// auctions or accounts; the auction is not retried.
async fn attempt_bid(executor: &BidExecutor, session: &VenueSession, auction: &Auction) {
    if let Err(e) = executor.place_bid(session, auction).await {
        error!("Bid attempt for auction {} failed: {}", auction.id, e);
    }
}
