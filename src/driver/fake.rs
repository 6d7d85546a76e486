//! Scripted driver for unit tests: an in-memory element table plus failure
//! toggles and a call journal, so fallback ordering and session lifecycle
//! can be asserted without a live browser.

use crate::errors::{AutomationError, Result};
use crate::types::{BrowserConfig, Selector};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{Driver, Probe};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub count: usize,
    pub visible: bool,
    pub enabled: bool,
    pub text: String,
    pub value: String,
    pub appears_after: Option<Duration>,
}

impl Default for FakeElement {
    fn default() -> Self {
        Self {
            count: 1,
            visible: true,
            enabled: true,
            text: String::new(),
            value: String::new(),
            appears_after: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct FailureFlags {
    pub launch: bool,
    pub url_probe: bool,
    pub navigate: bool,
    pub native_click: bool,
    pub scripted_click: bool,
    pub native_type: bool,
    pub char_type: bool,
    pub scripted_value: bool,
    pub native_clear: bool,
    pub scripted_clear: bool,
    pub keys_clear: bool,
    pub enter: bool,
    pub submit_button: bool,
    pub form_submit: bool,
}

#[derive(Debug)]
struct FakeState {
    launches: usize,
    closes: usize,
    running: bool,
    tabs: Vec<String>,
    elements: HashMap<String, FakeElement>,
    flags: FailureFlags,
    journal: Vec<String>,
    started: Instant,
}

#[derive(Debug)]
pub struct FakeDriver {
    state: Mutex<FakeState>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                launches: 0,
                closes: 0,
                running: false,
                tabs: Vec::new(),
                elements: HashMap::new(),
                flags: FailureFlags::default(),
                journal: Vec::new(),
                started: Instant::now(),
            }),
        }
    }

    pub fn with_element(self, selector: &Selector, element: FakeElement) -> Self {
        self.state
            .lock()
            .unwrap()
            .elements
            .insert(selector.describe(), element);
        self
    }

    pub fn set_flags(&self, configure: impl FnOnce(&mut FailureFlags)) {
        configure(&mut self.state.lock().unwrap().flags);
    }

    pub fn launches(&self) -> usize {
        self.state.lock().unwrap().launches
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn journal(&self) -> Vec<String> {
        self.state.lock().unwrap().journal.clone()
    }

    pub fn element_value(&self, selector: &Selector) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .elements
            .get(&selector.describe())
            .map(|e| e.value.clone())
    }

    fn record(&self, entry: String) {
        self.state.lock().unwrap().journal.push(entry);
    }

    fn not_found(selector: &Selector) -> AutomationError {
        AutomationError::ElementNotFound(format!("no element matching {}", selector.describe()))
    }
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeState {
    fn lookup(&self, selector: &Selector) -> Option<&FakeElement> {
        let element = self.elements.get(&selector.describe())?;
        if let Some(delay) = element.appears_after {
            if self.started.elapsed() < delay {
                return None;
            }
        }
        Some(element)
    }

    fn lookup_mut(&mut self, selector: &Selector) -> Option<&mut FakeElement> {
        let visible_yet = self.lookup(selector).is_some();
        if visible_yet {
            self.elements.get_mut(&selector.describe())
        } else {
            None
        }
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn launch(&mut self, _config: &BrowserConfig) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.flags.launch {
            return Err(AutomationError::Session(
                "browser binary missing".to_string(),
            ));
        }
        state.launches += 1;
        state.running = true;
        state.tabs.clear();
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.state.lock().unwrap().running
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.closes += 1;
        state.running = false;
        state.tabs.clear();
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.running {
            return Err(AutomationError::Session("browser not launched".to_string()));
        }
        if state.flags.navigate {
            return Err(AutomationError::Interaction(
                "navigation refused".to_string(),
            ));
        }
        state.journal.push(format!("open_tab {url}"));
        state.tabs.push(url.to_string());
        Ok(())
    }

    fn tab_count(&self) -> usize {
        self.state.lock().unwrap().tabs.len()
    }

    async fn current_url(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        if state.flags.url_probe {
            return Err(AutomationError::Driver("connection refused".to_string()));
        }
        state
            .tabs
            .last()
            .cloned()
            .ok_or_else(|| AutomationError::Session("no active tab".to_string()))
    }

    async fn ready_state(&self) -> Result<String> {
        Ok("complete".to_string())
    }

    async fn count_matches(&self, selector: &Selector) -> Result<usize> {
        let state = self.state.lock().unwrap();
        Ok(state.lookup(selector).map(|e| e.count).unwrap_or(0))
    }

    async fn probe(&self, selector: &Selector, _index: usize) -> Result<Probe> {
        let state = self.state.lock().unwrap();
        Ok(match state.lookup(selector) {
            Some(element) => Probe {
                present: true,
                visible: element.visible,
                enabled: element.enabled,
            },
            None => Probe::default(),
        })
    }

    async fn scroll_into_view(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("scroll_into_view {}", selector.describe()));
        let state = self.state.lock().unwrap();
        state
            .lookup(selector)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn focus(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("focus {}", selector.describe()));
        let state = self.state.lock().unwrap();
        state
            .lookup(selector)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn read_text(&self, selector: &Selector, _index: usize) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .lookup(selector)
            .map(|e| e.text.clone())
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn field_value(&self, selector: &Selector, _index: usize) -> Result<String> {
        let state = self.state.lock().unwrap();
        state
            .lookup(selector)
            .map(|e| e.value.clone())
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn click_native(&self, selector: &Selector, index: usize) -> Result<()> {
        self.record(format!("click_native {} {index}", selector.describe()));
        let state = self.state.lock().unwrap();
        if state.flags.native_click {
            return Err(AutomationError::Interaction(
                "native click refused".to_string(),
            ));
        }
        let element = state.lookup(selector).ok_or_else(|| Self::not_found(selector))?;
        if index >= element.count {
            return Err(Self::not_found(selector));
        }
        Ok(())
    }

    async fn click_scripted(&self, selector: &Selector, index: usize) -> Result<()> {
        self.record(format!("click_scripted {} {index}", selector.describe()));
        let state = self.state.lock().unwrap();
        if state.flags.scripted_click {
            return Err(AutomationError::Interaction(
                "scripted click refused".to_string(),
            ));
        }
        let element = state.lookup(selector).ok_or_else(|| Self::not_found(selector))?;
        if index >= element.count {
            return Err(Self::not_found(selector));
        }
        Ok(())
    }

    async fn clear_native(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("clear_native {}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.native_clear {
            return Err(AutomationError::Interaction(
                "native clear refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value.clear();
        Ok(())
    }

    async fn clear_scripted(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("clear_scripted {}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.scripted_clear {
            return Err(AutomationError::Interaction(
                "scripted clear refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value.clear();
        Ok(())
    }

    async fn clear_with_keys(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("clear_with_keys {}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.keys_clear {
            return Err(AutomationError::Interaction(
                "key clear refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value.clear();
        Ok(())
    }

    async fn type_native(&self, selector: &Selector, _index: usize, text: &str) -> Result<()> {
        self.record(format!("type_native {} {text:?}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.native_type {
            return Err(AutomationError::Interaction(
                "native typing refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value = text.to_string();
        Ok(())
    }

    async fn type_char(&self, selector: &Selector, _index: usize, ch: char) -> Result<()> {
        self.record(format!("type_char {} {ch:?}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.char_type {
            return Err(AutomationError::Interaction(
                "per-char typing refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value.push(ch);
        Ok(())
    }

    async fn set_value_scripted(
        &self,
        selector: &Selector,
        _index: usize,
        text: &str,
    ) -> Result<()> {
        self.record(format!("set_value {} {text:?}", selector.describe()));
        let mut state = self.state.lock().unwrap();
        if state.flags.scripted_value {
            return Err(AutomationError::Interaction(
                "scripted value refused".to_string(),
            ));
        }
        let element = state
            .lookup_mut(selector)
            .ok_or_else(|| Self::not_found(selector))?;
        element.value = text.to_string();
        Ok(())
    }

    async fn press_enter(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("press_enter {}", selector.describe()));
        let state = self.state.lock().unwrap();
        if state.flags.enter {
            return Err(AutomationError::Interaction(
                "enter key refused".to_string(),
            ));
        }
        state
            .lookup(selector)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn click_submit_control(&self) -> Result<()> {
        self.record("click_submit_control".to_string());
        let state = self.state.lock().unwrap();
        if state.flags.submit_button {
            return Err(AutomationError::Interaction(
                "no visible submit control on page".to_string(),
            ));
        }
        Ok(())
    }

    async fn submit_form_scripted(&self, selector: &Selector, _index: usize) -> Result<()> {
        self.record(format!("submit_form {}", selector.describe()));
        let state = self.state.lock().unwrap();
        if state.flags.form_submit {
            return Err(AutomationError::Interaction(
                "element has no enclosing form".to_string(),
            ));
        }
        Ok(())
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<()> {
        self.record(format!("scroll_by {delta_y}"));
        Ok(())
    }
}
