//! Bid executor
//!
//! Runs the submission sequence for a single auction: navigate to the
//! detail page, fill the bid-amount input, click place, settle, click
//! confirm, stamp the outcome. Any error aborts this auction only; the
//! outcome field is written only when every step completed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::driver::DriverError;
use crate::records::{Auction, RecordStore, StoreError};
use crate::session::VenueSession;
use crate::SniperConfig;

/// Suffix appended to the normalized ref to form the bid-input element id.
const BID_INPUT_SUFFIX: &str = "_bid";

/// Errors from a single bid attempt
#[derive(Error, Debug)]
pub enum BidError {
    #[error("Interaction failed: {0}")]
    Interaction(#[from] DriverError),

    #[error("Outcome write failed: {0}")]
    Outcome(#[from] StoreError),
}

/// Normalize a venue listing ref into its on-page identity: uppercased,
/// path separators stripped. "stg/1234" becomes "STG1234".
pub fn normalize_ref(external_ref: &str) -> String {
    external_ref
        .chars()
        .filter(|c| *c != '/' && *c != '\\')
        .collect::<String>()
        .to_uppercase()
}

/// CSS selector for an auction's bid-amount input.
pub fn bid_input_selector(external_ref: &str) -> String {
    format!("#{}{}", normalize_ref(external_ref), BID_INPUT_SUFFIX)
}

/// Places bids through an account's venue session.
pub struct BidExecutor {
    store: Arc<dyn RecordStore>,
    venue_base_url: String,
    place_bid_button: String,
    confirm_button: String,
    navigation_timeout: Duration,
    element_timeout: Duration,
    settle_delay: Duration,
}

impl BidExecutor {
    pub fn new(config: &SniperConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            venue_base_url: config.venue_base_url.clone(),
            place_bid_button: config.place_bid_button.clone(),
            confirm_button: config.confirm_button.clone(),
            navigation_timeout: config.navigation_timeout(),
            element_timeout: config.element_timeout(),
            settle_delay: config.settle_delay(),
        }
    }

    /// Deterministic detail-page URL for a listing.
    fn detail_url(&self, external_ref: &str) -> String {
        format!(
            "{}/{}",
            self.venue_base_url.trim_end_matches('/'),
            external_ref
        )
    }

    /// Run the full submission sequence for one auction.
    ///
    /// Success means the sequence completed, not that the venue accepted
    /// the bid; the outcome stamp records exactly that.
    pub async fn place_bid(
        &self,
        session: &VenueSession,
        auction: &Auction,
    ) -> Result<(), BidError> {
        // Exclusive page use for the whole attempt; armed bids for the same
        // account serialize here.
        let _guard = session.lock_interaction().await;

        let url = self.detail_url(&auction.external_ref);
        let input = bid_input_selector(&auction.external_ref);
        let amount = format!("{:.2}", auction.bid_amount);

        info!(
            "Placing bid of {} on auction {} ({}) via account {}",
            amount, auction.id, auction.external_ref, session.username
        );

        let page = session.page();

        page.navigate(&url, self.navigation_timeout).await?;
        page.wait_for_element(&input, self.element_timeout).await?;
        page.type_into(&input, &amount).await?;
        page.click(&self.place_bid_button).await?;

        // The confirmation UI renders asynchronously; a fixed settle delay,
        // not a readiness signal.
        debug!("Settling {:?} before confirming auction {}", self.settle_delay, auction.id);
        tokio::time::sleep(self.settle_delay).await;

        page.click(&self.confirm_button).await?;

        self.record_outcome(auction.id).await?;
        info!("Bid sequence completed for auction {}", auction.id);

        Ok(())
    }

    /// Load the latest records, merge the one outcome field, write the
    /// whole file back.
    async fn record_outcome(&self, auction_id: i64) -> Result<(), StoreError> {
        let (accounts, mut auctions) = self.store.load().await?;
        if let Some(auction) = auctions.iter_mut().find(|a| a.id == auction_id) {
            auction.bid_outcome_at = Some(Utc::now());
        }
        self.store.save(accounts, auctions).await
    }
}
