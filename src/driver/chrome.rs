//! Chrome-backed automation driver
//!
//! Launches one Chrome instance per venue session over CDP. Each session
//! gets its own scratch user-data directory and a single reusable page.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{AutomationDriver, DriverError, VenuePage};

/// Find Chrome/Chromium executable on the system
fn find_chrome() -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = if cfg!(target_os = "windows") {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(PathBuf::from(format!(
                r"{}\Google\Chrome\Application\chrome.exe",
                local
            )));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else {
        vec![
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/chromium"),
            PathBuf::from("/usr/bin/chromium-browser"),
        ]
    };

    candidates.into_iter().find(|p| p.exists())
}

/// Configuration for launching Chrome sessions
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChromeDriverConfig {
    /// Path to Chrome/Chromium executable; auto-detected when unset
    pub chrome_path: Option<String>,
    /// Run in headless mode
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
}

impl Default for ChromeDriverConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: false,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// Driver that opens one Chrome instance per session
pub struct ChromeDriver {
    config: ChromeDriverConfig,
}

impl ChromeDriver {
    pub fn new(config: ChromeDriverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AutomationDriver for ChromeDriver {
    async fn open_session(&self) -> Result<Box<dyn VenuePage>, DriverError> {
        let page = ChromePage::launch(&self.config).await?;
        Ok(Box::new(page))
    }
}

/// A live Chrome page driven over CDP
pub struct ChromePage {
    id: String,
    browser: Mutex<Option<Browser>>,
    page: Page,
    /// Flipped by the event-handler task when Chrome disconnects
    alive: Arc<AtomicBool>,
}

impl ChromePage {
    async fn launch(config: &ChromeDriverConfig) -> Result<Self, DriverError> {
        let session_id = format!("session-{}", &uuid::Uuid::new_v4().to_string()[..8]);

        if config.chrome_path.is_none() && find_chrome().is_none() {
            return Err(DriverError::LaunchFailed(
                "Chrome not found. Install Google Chrome or set chromePath in the config."
                    .to_string(),
            ));
        }

        let user_data_dir = std::env::temp_dir()
            .join("bidsniper")
            .join("browser_data")
            .join(&session_id);
        let _ = std::fs::create_dir_all(&user_data_dir);

        let mut builder = BrowserConfig::builder();

        // Headless is chromiumoxide's default; with_head opts out.
        if !config.headless {
            builder = builder.with_head();
        }

        if let Some(ref path) = config.chrome_path {
            builder = builder.chrome_executable(path);
        } else if let Some(chrome_path) = find_chrome() {
            debug!("Auto-detected Chrome at: {}", chrome_path.display());
            builder = builder.chrome_executable(chrome_path);
        }

        builder = builder
            .user_data_dir(&user_data_dir)
            .window_size(config.window_width, config.window_height)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-default-browser-check")
            .arg("--disable-session-crashed-bubble")
            .arg("--disable-restore-session-state")
            .arg("--disable-notifications")
            .arg("--no-sandbox");

        let browser_config = builder.build().map_err(DriverError::LaunchFailed)?;

        info!(
            "Launching Chrome session {} (headless: {})",
            session_id, config.headless
        );

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

        // When the handler stream ends, Chrome has disconnected or crashed.
        let alive = Arc::new(AtomicBool::new(true));
        let alive_for_handler = alive.clone();
        let handler_id = session_id.clone();
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    debug!("Session {} CDP event error: {:?}", handler_id, event);
                }
            }
            warn!("Session {} Chrome disconnected (event handler ended)", handler_id);
            alive_for_handler.store(false, Ordering::Relaxed);
        });

        // Chrome opens with one blank tab; reuse it and close any extras.
        let page = {
            let mut pages = browser
                .pages()
                .await
                .map_err(|e| DriverError::LaunchFailed(e.to_string()))?;

            let main_page = if !pages.is_empty() {
                pages.remove(0)
            } else {
                browser
                    .new_page("about:blank")
                    .await
                    .map_err(|e| DriverError::LaunchFailed(e.to_string()))?
            };

            for extra in pages {
                debug!("Closing extra blank tab");
                let _ = extra.close().await;
            }

            main_page
        };

        info!("Chrome session {} ready", session_id);

        Ok(Self {
            id: session_id,
            browser: Mutex::new(Some(browser)),
            page,
            alive,
        })
    }

    fn page(&self) -> Result<&Page, DriverError> {
        if !self.alive.load(Ordering::Relaxed) {
            return Err(DriverError::ConnectionLost("Chrome disconnected".into()));
        }
        Ok(&self.page)
    }
}

#[async_trait]
impl VenuePage for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), DriverError> {
        let page = self.page()?;

        debug!("Session {} navigating to: {}", self.id, url);
        tokio::time::timeout(timeout, page.goto(url))
            .await
            .map_err(|_| DriverError::Timeout(format!("Navigation to {} timed out", url)))?
            .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), DriverError> {
        let page = self.page()?;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(DriverError::Timeout(format!(
                    "Element {} not found within {:?}",
                    selector, timeout
                )));
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    }

    async fn type_into(&self, selector: &str, text: &str) -> Result<(), DriverError> {
        let page = self.page()?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| DriverError::InteractionFailed(e.to_string()))?;

        // Select any prefilled value so typing replaces it.
        let _ = page
            .evaluate(format!("document.querySelector({:?})?.select()", selector))
            .await;

        // Human-like delays between keystrokes (50-150ms)
        for c in text.chars() {
            element
                .type_str(c.to_string())
                .await
                .map_err(|e| DriverError::InteractionFailed(e.to_string()))?;

            let delay = rand::thread_rng().gen_range(50..150);
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), DriverError> {
        let page = self.page()?;

        let element = page
            .find_element(selector)
            .await
            .map_err(|e| DriverError::ElementNotFound(format!("{}: {}", selector, e)))?;

        element
            .click()
            .await
            .map_err(|e| DriverError::InteractionFailed(e.to_string()))?;

        Ok(())
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<(), DriverError> {
        let page = self.page()?;

        tokio::time::timeout(timeout, page.wait_for_navigation())
            .await
            .map_err(|_| DriverError::Timeout("Navigation timeout".into()))?
            .map_err(|e| DriverError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn close(&self) -> Result<(), DriverError> {
        // Mark dead first so no new operations start against this page.
        self.alive.store(false, Ordering::Relaxed);

        let _ = self.page.clone().close().await;

        // Graceful close, brief grace period, then force kill so no Chrome
        // child processes linger.
        let mut browser = self.browser.lock().await;
        if let Some(mut b) = browser.take() {
            let _ = b.close().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = b.kill().await;
        }

        info!("Chrome session {} closed", self.id);
        Ok(())
    }
}
