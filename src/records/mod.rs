//! Account and auction records
//!
//! Data model for venue accounts and tracked auction listings, plus the
//! whole-collection record store the scheduler and executor read and write.

mod store;
mod types;

pub use store::{JsonRecordStore, RecordStore, StoreError};
pub use types::{Account, Auction, RecordFile};

#[cfg(test)]
pub(crate) use store::testing;
