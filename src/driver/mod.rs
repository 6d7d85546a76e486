//! Seam between the automation core and the browser backend.
//!
//! The core only ever talks to a [`Driver`]; the production implementation
//! drives Chrome over CDP, tests use a scripted in-memory driver.

use crate::errors::Result;
use crate::types::{BrowserConfig, Selector};
use async_trait::async_trait;

pub mod chrome;
#[cfg(test)]
pub mod fake;

pub use chrome::ChromeDriver;

/// Element state as seen by a single probe. Presence and interactability are
/// distinct predicates on purpose: `wait` cares about the former only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Probe {
    pub present: bool,
    pub visible: bool,
    pub enabled: bool,
}

impl Probe {
    pub fn interactable(&self) -> bool {
        self.present && self.visible && self.enabled
    }
}

#[async_trait]
pub trait Driver: Send + Sync {
    // Lifecycle
    async fn launch(&mut self, config: &BrowserConfig) -> Result<()>;
    fn is_running(&self) -> bool;
    async fn close(&mut self) -> Result<()>;

    // Windows / page state
    /// Opens `url` in a fresh tab and makes that tab active.
    async fn open_tab(&mut self, url: &str) -> Result<()>;
    fn tab_count(&self) -> usize;
    async fn current_url(&self) -> Result<String>;
    async fn ready_state(&self) -> Result<String>;

    // Element inspection
    async fn count_matches(&self, selector: &Selector) -> Result<usize>;
    async fn probe(&self, selector: &Selector, index: usize) -> Result<Probe>;
    async fn scroll_into_view(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn focus(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn read_text(&self, selector: &Selector, index: usize) -> Result<String>;
    async fn field_value(&self, selector: &Selector, index: usize) -> Result<String>;

    // Clicking
    async fn click_native(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn click_scripted(&self, selector: &Selector, index: usize) -> Result<()>;

    // Clearing
    async fn clear_native(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn clear_scripted(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn clear_with_keys(&self, selector: &Selector, index: usize) -> Result<()>;

    // Typing
    async fn type_native(&self, selector: &Selector, index: usize, text: &str) -> Result<()>;
    async fn type_char(&self, selector: &Selector, index: usize, ch: char) -> Result<()>;
    async fn set_value_scripted(&self, selector: &Selector, index: usize, text: &str)
        -> Result<()>;

    // Submission
    async fn press_enter(&self, selector: &Selector, index: usize) -> Result<()>;
    async fn click_submit_control(&self) -> Result<()>;
    async fn submit_form_scripted(&self, selector: &Selector, index: usize) -> Result<()>;

    // Page scrolling
    async fn scroll_by(&self, delta_y: i64) -> Result<()>;
}
