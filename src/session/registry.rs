//! Session registry
//!
//! Owns every live venue session, keyed by account username. The map lock
//! is held across session creation, so the registry is a single
//! registration point: one account can never race into two live sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::driver::{AutomationDriver, DriverError, VenuePage};

/// One automation session for a single account.
///
/// Holds the open page handle and the login state. A failed bid leaves the
/// session open for the next attempt; only `SessionRegistry::close_all`
/// tears it down.
pub struct VenueSession {
    pub username: String,
    page: Box<dyn VenuePage>,
    authenticated: AtomicBool,
    /// A page cannot be driven by two operations at once.
    interaction: Mutex<()>,
}

impl VenueSession {
    fn new(username: &str, page: Box<dyn VenuePage>) -> Self {
        Self {
            username: username.to_string(),
            page,
            authenticated: AtomicBool::new(false),
            interaction: Mutex::new(()),
        }
    }

    pub fn page(&self) -> &dyn VenuePage {
        self.page.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::Relaxed)
    }

    pub fn set_authenticated(&self, value: bool) {
        self.authenticated.store(value, Ordering::Relaxed);
    }

    /// Exclusive use of the page for the duration of one operation.
    pub async fn lock_interaction(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.interaction.lock().await
    }

    pub async fn close(&self) -> Result<(), DriverError> {
        self.page.close().await
    }
}

/// Registry owning at most one live session per account.
pub struct SessionRegistry {
    driver: Arc<dyn AutomationDriver>,
    sessions: Mutex<HashMap<String, Arc<VenueSession>>>,
}

impl SessionRegistry {
    pub fn new(driver: Arc<dyn AutomationDriver>) -> Self {
        Self {
            driver,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the existing session for the account unchanged, whatever its
    /// authentication state, or open and register a new one.
    pub async fn acquire(&self, username: &str) -> Result<Arc<VenueSession>, DriverError> {
        let mut sessions = self.sessions.lock().await;

        if let Some(existing) = sessions.get(username) {
            debug!("Reusing session for account {}", username);
            return Ok(existing.clone());
        }

        info!("Opening session for account {}", username);
        let page = self.driver.open_session().await?;
        let session = Arc::new(VenueSession::new(username, page));
        sessions.insert(username.to_string(), session.clone());

        Ok(session)
    }

    /// Close every session and clear the registry. Safe with zero sessions.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<Arc<VenueSession>> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().map(|(_, s)| s).collect()
        };

        let count = drained.len();
        for session in drained {
            if let Err(e) = session.close().await {
                warn!("Error closing session for {}: {}", session.username, e);
            }
        }

        if count > 0 {
            info!("All {} venue session(s) closed", count);
        }
        count
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
