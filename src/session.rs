//! Lifecycle of the single browser session.
//!
//! Exactly one session is live at a time. `ensure_ready` either hands back a
//! ready driver or raises; callers never observe a half-initialized session.

use crate::driver::Driver;
use crate::errors::{AutomationError, Result};
use crate::types::BrowserConfig;
use tracing::{info, warn};
use uuid::Uuid;

/// Neutral anchor page opened on startup so the session always has a tab.
const ANCHOR_URL: &str = "about:blank";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Absent,
    Starting,
    Ready,
    Unresponsive,
    Closed,
}

pub struct SessionManager<D: Driver> {
    driver: D,
    config: BrowserConfig,
    state: SessionState,
    session_id: Option<Uuid>,
}

impl<D: Driver> SessionManager<D> {
    pub fn new(driver: D, config: BrowserConfig) -> Self {
        Self {
            driver,
            config,
            state: SessionState::Absent,
            session_id: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    #[cfg(test)]
    pub(crate) fn driver_ref(&self) -> &D {
        &self.driver
    }

    /// Idempotent: returns once the session is ready, creating or healing it
    /// as needed. A live session is only re-checked with a cheap URL probe.
    pub async fn ensure_ready(&mut self) -> Result<&mut D> {
        if self.state == SessionState::Ready {
            match self.driver.current_url().await {
                Ok(_) => return Ok(&mut self.driver),
                Err(e) => {
                    warn!(error = %e, "session liveness probe failed, restarting browser");
                    self.state = SessionState::Unresponsive;
                    if let Err(close_err) = self.driver.close().await {
                        warn!(error = %close_err, "error closing unresponsive session");
                    }
                }
            }
        }

        self.state = SessionState::Starting;
        self.driver
            .launch(&self.config)
            .await
            .map_err(|e| AutomationError::Session(format!("browser startup failed: {e}")))?;
        self.driver
            .open_tab(ANCHOR_URL)
            .await
            .map_err(|e| AutomationError::Session(format!("anchor tab failed: {e}")))?;

        let id = Uuid::new_v4();
        self.session_id = Some(id);
        self.state = SessionState::Ready;
        info!(session_id = %id, "browser session ready");
        Ok(&mut self.driver)
    }

    /// Best-effort shutdown: faults from an already-dead session are
    /// swallowed, but the state always ends up `Closed`.
    pub async fn close(&mut self) {
        if let Err(e) = self.driver.close().await {
            warn!(error = %e, "error during session close");
        }
        if let Some(id) = self.session_id.take() {
            info!(session_id = %id, "browser session closed");
        }
        self.state = SessionState::Closed;
    }
}
