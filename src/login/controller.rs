//! Login controller
//!
//! Drives the venue's login surface: fill username, fill password, submit,
//! wait for the post-login navigation. Repeated calls on an authenticated
//! session perform zero driver work.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::driver::DriverError;
use crate::records::Account;
use crate::session::VenueSession;
use crate::SniperConfig;

/// Selectors for the venue login surface
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSelectors {
    pub username_input: String,
    pub password_input: String,
    pub submit_button: String,
}

impl Default for LoginSelectors {
    fn default() -> Self {
        Self {
            username_input: "input[name='username']".to_string(),
            password_input: "input[name='password']".to_string(),
            submit_button: "button[type='submit']".to_string(),
        }
    }
}

/// Idempotent venue authentication
pub struct LoginController {
    login_url: String,
    selectors: LoginSelectors,
    navigation_timeout: Duration,
    element_timeout: Duration,
}

impl LoginController {
    pub fn new(config: &SniperConfig) -> Self {
        Self {
            login_url: config.login_url.clone(),
            selectors: config.login_selectors.clone(),
            navigation_timeout: config.navigation_timeout(),
            element_timeout: config.element_timeout(),
        }
    }

    /// No-op when the session is already authenticated. A failed handshake
    /// is logged and leaves the session unauthenticated; the caller's
    /// bidding pass continues regardless.
    pub async fn ensure_authenticated(&self, session: &VenueSession, account: &Account) {
        if session.is_authenticated() {
            debug!("Session for {} already authenticated", session.username);
            return;
        }

        match self.login(session, account).await {
            Ok(()) => {
                session.set_authenticated(true);
                info!("Account {} logged in", account.username);
            }
            Err(e) => {
                warn!(
                    "Login failed for account {}: {} (continuing unauthenticated)",
                    account.username, e
                );
            }
        }
    }

    async fn login(&self, session: &VenueSession, account: &Account) -> Result<(), DriverError> {
        let page = session.page();

        page.navigate(&self.login_url, self.navigation_timeout).await?;

        page.wait_for_element(&self.selectors.username_input, self.element_timeout)
            .await?;
        page.type_into(&self.selectors.username_input, &account.username)
            .await?;

        page.wait_for_element(&self.selectors.password_input, self.element_timeout)
            .await?;
        page.type_into(&self.selectors.password_input, &account.password)
            .await?;

        page.click(&self.selectors.submit_button).await?;
        page.wait_for_navigation(self.navigation_timeout).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use super::*;
    use crate::driver::testing::MockDriver;
    use crate::driver::AutomationDriver;
    use crate::session::SessionRegistry;

    fn account() -> Account {
        Account {
            id: 1,
            username: "alice".into(),
            password: "hunter2".into(),
        }
    }

    async fn session_with(driver: &Arc<MockDriver>) -> Arc<VenueSession> {
        let registry = SessionRegistry::new(driver.clone() as Arc<dyn AutomationDriver>);
        registry.acquire("alice").await.unwrap()
    }

    #[tokio::test]
    async fn login_runs_the_full_handshake() {
        let driver = Arc::new(MockDriver::default());
        let session = session_with(&driver).await;
        let controller = LoginController::new(&SniperConfig::default());

        controller.ensure_authenticated(&session, &account()).await;

        assert!(session.is_authenticated());
        let ops = driver.page(0).ops();
        assert_eq!(
            ops,
            vec![
                format!("navigate:{}", SniperConfig::default().login_url),
                "wait:input[name='username']".to_string(),
                "type:input[name='username']=alice".to_string(),
                "wait:input[name='password']".to_string(),
                "type:input[name='password']=hunter2".to_string(),
                "click:button[type='submit']".to_string(),
                "nav-wait".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn second_call_performs_no_driver_work() {
        let driver = Arc::new(MockDriver::default());
        let session = session_with(&driver).await;
        let controller = LoginController::new(&SniperConfig::default());

        controller.ensure_authenticated(&session, &account()).await;
        let ops_after_first = driver.page(0).op_count();

        controller.ensure_authenticated(&session, &account()).await;

        assert_eq!(driver.page(0).op_count(), ops_after_first);
    }

    #[tokio::test]
    async fn failed_login_leaves_session_unauthenticated() {
        let driver = Arc::new(MockDriver::default());
        driver.fail_navigation.store(true, Ordering::Relaxed);
        let session = session_with(&driver).await;
        let controller = LoginController::new(&SniperConfig::default());

        controller.ensure_authenticated(&session, &account()).await;

        assert!(!session.is_authenticated());
        assert_eq!(driver.page(0).op_count(), 0);
    }
}
