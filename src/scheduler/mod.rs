//! Deadline scheduling
//!
//! Orchestrates scheduling passes over the tracked auctions: one session
//! and one login per account, immediate bids for overdue deadlines, one
//! armed timer per future deadline.

mod deadlines;

pub use deadlines::{DeadlineScheduler, ScheduledBid, SniperError};
