//! Bid Sniper
//!
//! Deadline-driven bidding on tracked auction listings: one authenticated
//! browser session per venue account, one armed timer per auction deadline,
//! a fixed submission sequence at fire time, durable outcome stamps in a
//! JSON record file.

pub mod bid;
pub mod driver;
pub mod login;
pub mod records;
pub mod scheduler;
pub mod session;

use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info, warn};

use driver::ChromeDriverConfig;
use login::LoginSelectors;

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SniperConfig {
    /// Venue root for auction detail pages: {venueBaseUrl}/{externalRef}
    pub venue_base_url: String,
    /// Venue login surface
    pub login_url: String,
    pub login_selectors: LoginSelectors,
    /// Primary "place bid" control on a detail page
    pub place_bid_button: String,
    /// Confirmation control rendered after the place-bid click
    pub confirm_button: String,

    /// Chrome launch options
    #[serde(default)]
    pub chrome: ChromeDriverConfig,

    /// Bound on page navigations, in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Bound on interactive element waits, in seconds
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,
    /// Settle delay between the place-bid click and the confirmation click
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Records file override (defaults to the config directory)
    #[serde(default)]
    pub records_path: Option<String>,
}

fn default_navigation_timeout_secs() -> u64 {
    60
}

fn default_element_timeout_secs() -> u64 {
    15
}

fn default_settle_delay_ms() -> u64 {
    3_000
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            venue_base_url: "https://bid.example.com/listings".to_string(),
            login_url: "https://bid.example.com/login".to_string(),
            login_selectors: LoginSelectors::default(),
            place_bid_button: "#placeBidButton".to_string(),
            confirm_button: "#confirmBidButton".to_string(),
            chrome: ChromeDriverConfig::default(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            element_timeout_secs: default_element_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            records_path: None,
        }
    }
}

impl SniperConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("bidsniper").join("config.json"))
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Failed to create config directory: {}", e);
                    return;
                }
            }

            match serde_json::to_string_pretty(self) {
                Ok(content) => {
                    if let Err(e) = std::fs::write(&path, content) {
                        error!("Failed to save config: {}", e);
                    } else {
                        info!("Config saved to {:?}", path);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize config: {}", e);
                }
            }
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("bidsniper").join("logs"))
}

/// Initialize logging (console layer plus a daily-rolling file layer)
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "bidsniper.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}
