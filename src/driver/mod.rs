//! Automation driver abstraction
//!
//! The core never talks to a concrete browser type. Login and bidding drive
//! the venue through these capability traits; the Chrome implementation
//! lives in `chrome` and tests substitute a recording mock.

mod chrome;
mod errors;

pub use chrome::{ChromeDriver, ChromeDriverConfig};
pub use errors::DriverError;

use std::time::Duration;

use async_trait::async_trait;

/// One open page inside an automation session.
///
/// Every remote interaction is time-bounded by the caller; exceeding a bound
/// is a normal failure, not a crash.
#[async_trait]
pub trait VenuePage: Send + Sync {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Poll until the selector matches or the bound elapses.
    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Replace the element's current value (select-all semantics) by typing.
    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError>;

    async fn click(&self, selector: &str) -> Result<(), DriverError>;

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

/// Launches automation sessions (one browser + one reusable page each).
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn VenuePage>, DriverError>;
}
