//! Bid submission
//!
//! The fixed interaction sequence that places and confirms one bid on the
//! venue's auction detail page.

mod executor;

pub use executor::{bid_input_selector, normalize_ref, BidError, BidExecutor};
