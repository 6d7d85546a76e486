use crate::errors::{AutomationError, Result};
use crate::types::{BrowserConfig, Selector};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::sync::Arc;

use super::{Driver, Probe};

/// Chrome implementation of the driver seam, speaking CDP via
/// `headless_chrome`. Element operations that have no first-class CDP
/// equivalent go through small inline scripts.
pub struct ChromeDriver {
    browser: Option<Browser>,
    tabs: Vec<Arc<Tab>>,
    active: usize,
}

impl ChromeDriver {
    pub fn new() -> Self {
        Self {
            browser: None,
            tabs: Vec::new(),
            active: 0,
        }
    }

    fn active_tab(&self) -> Result<&Arc<Tab>> {
        self.tabs
            .get(self.active)
            .ok_or_else(|| AutomationError::Session("no active tab".to_string()))
    }

    fn eval(&self, script: &str) -> Result<Value> {
        let tab = self.active_tab()?;
        // headless_chrome surfaces anyhow errors; From lands them as Driver faults
        let result = tab.evaluate(script, false)?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    /// Evaluate an expression and bring a structured result back through
    /// JSON.stringify; CDP returns objects by reference otherwise.
    fn eval_json(&self, expr: &str) -> Result<Value> {
        let wrapped = format!("JSON.stringify({expr})");
        match self.eval(&wrapped)? {
            Value::String(s) => serde_json::from_str(&s)
                .map_err(|e| AutomationError::Driver(format!("bad script result: {e}"))),
            Value::Null => Ok(Value::Null),
            other => Ok(other),
        }
    }

    /// Run an element-addressed script that reports success as a boolean.
    fn element_op(&self, script: &str, selector: &Selector) -> Result<()> {
        if self.eval(script)?.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(AutomationError::ElementNotFound(format!(
                "no element matching {}",
                selector.describe()
            )))
        }
    }
}

impl Default for ChromeDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

/// JS expression locating the `index`-th match of `selector`, or undefined.
fn element_expr(selector: &Selector, index: usize) -> String {
    match selector.as_css() {
        Some(css) => format!("document.querySelectorAll({})[{}]", js_string(&css), index),
        None => format!(
            "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotItem({})",
            js_string(&selector.value),
            index
        ),
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn launch(&mut self, config: &BrowserConfig) -> Result<()> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={ua}"));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| AutomationError::Session(format!("browser launch failed: {e}")))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| AutomationError::Session(format!("browser launch failed: {e}")))?;

        self.browser = Some(browser);
        self.tabs.clear();
        self.active = 0;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.tabs.clear();
        // Dropping the Browser handle tears down the Chrome process.
        self.browser = None;
        Ok(())
    }

    async fn open_tab(&mut self, url: &str) -> Result<()> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| AutomationError::Session("browser not launched".to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AutomationError::Session(format!("tab creation failed: {e}")))?;
        tab.navigate_to(url)
            .map_err(|e| AutomationError::Interaction(format!("navigation failed: {e}")))?;

        self.tabs.push(tab);
        self.active = self.tabs.len() - 1;
        Ok(())
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.active_tab()?.get_url())
    }

    async fn ready_state(&self) -> Result<String> {
        let state = self.eval("document.readyState")?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    async fn count_matches(&self, selector: &Selector) -> Result<usize> {
        let script = match selector.as_css() {
            Some(css) => format!("document.querySelectorAll({}).length", js_string(&css)),
            None => format!(
                "document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength",
                js_string(&selector.value)
            ),
        };
        let count = self.eval(&script)?;
        Ok(count.as_u64().unwrap_or(0) as usize)
    }

    async fn probe(&self, selector: &Selector, index: usize) -> Result<Probe> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return {{ present: false, visible: false, enabled: false }};
                const rect = el.getBoundingClientRect();
                const style = window.getComputedStyle(el);
                const visible = rect.width > 0 && rect.height > 0 &&
                    style.visibility !== 'hidden' && style.display !== 'none' &&
                    parseFloat(style.opacity) > 0;
                return {{ present: true, visible: visible, enabled: !el.disabled }};
            }})()"#,
            element_expr(selector, index)
        );
        let value = self.eval_json(&script)?;
        let field = |name: &str| value.get(name).and_then(Value::as_bool).unwrap_or(false);
        Ok(Probe {
            present: field("present"),
            visible: field("visible"),
            enabled: field("enabled"),
        })
    }

    async fn scroll_into_view(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.scrollIntoView({{ block: 'center' }});
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        self.element_op(&script, selector)
    }

    async fn focus(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.focus();
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        self.element_op(&script, selector)
    }

    async fn read_text(&self, selector: &Selector, index: usize) -> Result<String> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return {{ found: false, text: '' }};
                return {{ found: true, text: el.innerText || el.textContent || '' }};
            }})()"#,
            element_expr(selector, index)
        );
        let value = self.eval_json(&script)?;
        if value.get("found").and_then(Value::as_bool) != Some(true) {
            return Err(AutomationError::ElementNotFound(format!(
                "no element matching {}",
                selector.describe()
            )));
        }
        Ok(value
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }

    async fn field_value(&self, selector: &Selector, index: usize) -> Result<String> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return null;
                return el.value !== undefined ? String(el.value) : '';
            }})()"#,
            element_expr(selector, index)
        );
        match self.eval(&script)? {
            Value::String(s) => Ok(s),
            _ => Err(AutomationError::ElementNotFound(format!(
                "no element matching {}",
                selector.describe()
            ))),
        }
    }

    async fn click_native(&self, selector: &Selector, index: usize) -> Result<()> {
        let tab = self.active_tab()?;
        match selector.as_css() {
            Some(css) => {
                let elements = tab
                    .find_elements(&css)
                    .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
                let element = elements.get(index).ok_or_else(|| {
                    AutomationError::ElementNotFound(format!(
                        "no match at index {index} for {}",
                        selector.describe()
                    ))
                })?;
                element
                    .click()
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                Ok(())
            }
            None if index == 0 => {
                let element = tab
                    .find_element_by_xpath(&selector.value)
                    .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
                element
                    .click()
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                Ok(())
            }
            None => Err(AutomationError::Interaction(
                "native click addresses only the first xpath match".to_string(),
            )),
        }
    }

    async fn click_scripted(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        self.element_op(&script, selector)
    }

    async fn clear_native(&self, selector: &Selector, index: usize) -> Result<()> {
        self.click_native(selector, index).await?;
        self.clear_scripted(selector, index).await
    }

    async fn clear_scripted(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.value = '';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        self.element_op(&script, selector)
    }

    async fn clear_with_keys(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.focus();
                if (el.select) el.select();
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        self.element_op(&script, selector)?;
        self.active_tab()?
            .press_key("Backspace")
            .map_err(|e| AutomationError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn type_native(&self, selector: &Selector, index: usize, text: &str) -> Result<()> {
        let tab = self.active_tab()?;
        match selector.as_css() {
            Some(css) => {
                let elements = tab
                    .find_elements(&css)
                    .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
                let element = elements.get(index).ok_or_else(|| {
                    AutomationError::ElementNotFound(format!(
                        "no match at index {index} for {}",
                        selector.describe()
                    ))
                })?;
                element
                    .click()
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                element
                    .type_into(text)
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                Ok(())
            }
            None if index == 0 => {
                let element = tab
                    .find_element_by_xpath(&selector.value)
                    .map_err(|e| AutomationError::ElementNotFound(e.to_string()))?;
                element
                    .click()
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                element
                    .type_into(text)
                    .map_err(|e| AutomationError::Interaction(e.to_string()))?;
                Ok(())
            }
            None => Err(AutomationError::Interaction(
                "native typing addresses only the first xpath match".to_string(),
            )),
        }
    }

    async fn type_char(&self, selector: &Selector, index: usize, ch: char) -> Result<()> {
        self.focus(selector, index).await?;
        self.active_tab()?
            .type_str(&ch.to_string())
            .map_err(|e| AutomationError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn set_value_scripted(
        &self,
        selector: &Selector,
        index: usize,
        text: &str,
    ) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el) return false;
                el.focus();
                el.value = {};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            element_expr(selector, index),
            js_string(text)
        );
        self.element_op(&script, selector)
    }

    async fn press_enter(&self, selector: &Selector, index: usize) -> Result<()> {
        self.focus(selector, index).await?;
        self.active_tab()?
            .press_key("Enter")
            .map_err(|e| AutomationError::Interaction(e.to_string()))?;
        Ok(())
    }

    async fn click_submit_control(&self) -> Result<()> {
        let script = r#"(function() {
            const controls = document.querySelectorAll("input[type='submit'], button[type='submit']");
            for (const control of controls) {
                const rect = control.getBoundingClientRect();
                if (rect.width > 0 && rect.height > 0 && !control.disabled) {
                    control.click();
                    return true;
                }
            }
            return false;
        })()"#;
        if self.eval(script)?.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(AutomationError::Interaction(
                "no visible submit control on page".to_string(),
            ))
        }
    }

    async fn submit_form_scripted(&self, selector: &Selector, index: usize) -> Result<()> {
        let script = format!(
            r#"(function() {{
                const el = {};
                if (!el || !el.form) return false;
                el.form.submit();
                return true;
            }})()"#,
            element_expr(selector, index)
        );
        if self.eval(&script)?.as_bool() == Some(true) {
            Ok(())
        } else {
            Err(AutomationError::Interaction(format!(
                "element {} has no enclosing form",
                selector.describe()
            )))
        }
    }

    async fn scroll_by(&self, delta_y: i64) -> Result<()> {
        self.eval(&format!("window.scrollBy(0, {delta_y})"))?;
        Ok(())
    }
}
