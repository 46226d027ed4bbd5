//! Durable record storage
//!
//! Whole-collection read/replace over a single JSON document. There is no
//! partial-update API: an outcome write loads the latest file, merges one
//! field and writes the whole file back (last writer wins).

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::{Account, Auction, RecordFile};

/// Record storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No records path available")]
    NoPath,
}

/// Whole-collection record storage consumed by the scheduler and executor.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self) -> Result<(Vec<Account>, Vec<Auction>), StoreError>;
    async fn save(
        &self,
        accounts: Vec<Account>,
        auctions: Vec<Auction>,
    ) -> Result<(), StoreError>;
}

/// JSON file-backed record store
pub struct JsonRecordStore {
    path: PathBuf,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default records location under the user config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bidsniper").join("records.json"))
    }

    pub fn at_default_path() -> Result<Self, StoreError> {
        Self::default_path().map(Self::new).ok_or(StoreError::NoPath)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn load(&self) -> Result<(Vec<Account>, Vec<Auction>), StoreError> {
        if !self.path.exists() {
            debug!("No records file at {:?}, starting empty", self.path);
            return Ok((Vec::new(), Vec::new()));
        }

        let content = std::fs::read_to_string(&self.path)?;
        let file: RecordFile = serde_json::from_str(&content)?;
        Ok((file.accounts, file.auctions))
    }

    async fn save(
        &self,
        accounts: Vec<Account>,
        auctions: Vec<Auction>,
    ) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&RecordFile { accounts, auctions })?;
        std::fs::write(&self.path, content)?;
        info!("Records saved to {:?}", self.path);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join("bidsniper-tests")
            .join(format!("records_{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_collections() {
        let store = JsonRecordStore::new(scratch_path());
        let (accounts, auctions) = store.load().await.unwrap();
        assert!(accounts.is_empty());
        assert!(auctions.is_empty());
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let path = scratch_path();
        let store = JsonRecordStore::new(&path);

        let accounts = vec![Account {
            id: 1,
            username: "alice".into(),
            password: "hunter2".into(),
        }];
        let auctions = vec![Auction {
            id: 10,
            external_ref: "stg/1234".into(),
            deadline: None,
            bid_amount: dec!(42.50),
            address: "12 Lockup Row".into(),
            account_username: "alice".into(),
            bid_outcome_at: None,
        }];

        store.save(accounts, auctions).await.unwrap();

        let (accounts, auctions) = store.load().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].username, "alice");
        assert_eq!(auctions.len(), 1);
        assert_eq!(auctions[0].bid_amount, dec!(42.50));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn save_replaces_whole_collections() {
        let path = scratch_path();
        let store = JsonRecordStore::new(&path);

        let auction = |id: i64| Auction {
            id,
            external_ref: format!("stg/{id}"),
            deadline: None,
            bid_amount: dec!(5),
            address: String::new(),
            account_username: String::new(),
            bid_outcome_at: None,
        };

        store.save(Vec::new(), vec![auction(1), auction(2)]).await.unwrap();
        store.save(Vec::new(), vec![auction(3)]).await.unwrap();

        let (_, auctions) = store.load().await.unwrap();
        assert_eq!(auctions.len(), 1);
        assert_eq!(auctions[0].id, 3);

        let _ = std::fs::remove_file(&path);
    }
}
