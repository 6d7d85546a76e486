//! One routine per action, each with an explicit fallback ladder: the
//! primary mechanism first, then progressively lower-level ones. Ladders
//! are ordered mechanism lists sharing one attempt shape, so adding a rung
//! never touches control flow.

use crate::driver::Driver;
use crate::errors::{AutomationError, Result};
use crate::locator::{Locator, ResolvedElement};
use crate::types::{
    ClickParams, FillFormParams, NavigateParams, ReadParams, ScrollDirection, ScrollParams,
    SearchParams, Selector, TimeoutConfig, TypeParams, WaitParams,
};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
enum ClickMechanism {
    Native,
    Scripted,
}

impl ClickMechanism {
    const LADDER: [Self; 2] = [Self::Native, Self::Scripted];

    fn name(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Scripted => "scripted",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TypeMechanism {
    Native,
    CharByChar,
    ScriptedValue,
}

impl TypeMechanism {
    const LADDER: [Self; 3] = [Self::Native, Self::CharByChar, Self::ScriptedValue];

    fn name(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::CharByChar => "char-by-char",
            Self::ScriptedValue => "scripted-value",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ClearMechanism {
    Native,
    ScriptedReset,
    SelectAllDelete,
}

impl ClearMechanism {
    const ALL: [Self; 3] = [Self::Native, Self::ScriptedReset, Self::SelectAllDelete];

    fn name(&self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::ScriptedReset => "scripted-reset",
            Self::SelectAllDelete => "select-all-delete",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SubmitMechanism {
    EnterKey,
    SubmitButton,
    ScriptedForm,
}

impl SubmitMechanism {
    const LADDER: [Self; 3] = [Self::EnterKey, Self::SubmitButton, Self::ScriptedForm];

    fn name(&self) -> &'static str {
        match self {
            Self::EnterKey => "enter-key",
            Self::SubmitButton => "submit-button",
            Self::ScriptedForm => "scripted-form",
        }
    }
}

/// Outcome of `fill_form`: which fields were filled before the first fault,
/// and the fault itself if one occurred.
#[derive(Debug)]
pub struct FillReport {
    pub completed: Vec<String>,
    pub failed: Option<(String, AutomationError)>,
}

/// Lower-level driver faults surface to callers as interaction failures.
fn as_interaction(err: AutomationError) -> AutomationError {
    match err {
        AutomationError::Driver(msg) => AutomationError::Interaction(msg),
        other => other,
    }
}

fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AutomationError::Validation("url must not be empty".to_string()));
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    url::Url::parse(&with_scheme)
        .map_err(|e| AutomationError::Validation(format!("invalid url '{raw}': {e}")))?;
    Ok(with_scheme)
}

/// Search-box candidate ladder: the caller's selector first, then the
/// common fallbacks, skipping any rung identical to the caller's choice.
fn search_ladder(search_box_selector: &str) -> Vec<Selector> {
    let primary = Selector::css(search_box_selector);
    let fallbacks = [
        Selector::css("input[name=\"q\"]"),
        Selector::css("input#search"),
        Selector::css("#search input"),
        Selector::name("q"),
        Selector::tag("input"),
    ];
    let mut ladder = vec![primary.clone()];
    ladder.extend(fallbacks.into_iter().filter(|rung| *rung != primary));
    ladder
}

pub struct Executor {
    locator: Locator,
    timeouts: TimeoutConfig,
}

impl Executor {
    pub fn new(timeouts: TimeoutConfig) -> Self {
        Self {
            locator: Locator::new(timeouts.poll_interval_ms, timeouts.min_strategy_slice_ms),
            timeouts,
        }
    }

    fn default_budget(&self) -> Duration {
        Duration::from_millis(self.timeouts.default_ms)
    }

    async fn wait_for_ready_state<D: Driver>(&self, driver: &D, budget: Duration) -> Result<()> {
        let deadline = Instant::now() + budget;
        loop {
            match driver.ready_state().await {
                Ok(state) if state == "complete" => return Ok(()),
                Ok(_) => {}
                Err(e) => debug!(error = %e, "readyState probe failed"),
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::Interaction(format!(
                    "page did not reach readyState complete within {}ms",
                    budget.as_millis()
                )));
            }
            tokio::time::sleep(Duration::from_millis(self.timeouts.poll_interval_ms)).await;
        }
    }

    /// Open the target in a fresh tab that becomes active and wait for the
    /// document to finish loading. Scheme-less URLs default to https.
    pub async fn navigate<D: Driver>(
        &self,
        driver: &mut D,
        params: &NavigateParams,
    ) -> Result<Value> {
        let url = normalize_url(&params.url)?;
        driver.open_tab(&url).await.map_err(as_interaction)?;
        self.wait_for_ready_state(driver, self.default_budget()).await?;
        Ok(json!({ "url": url }))
    }

    /// Click the `index`-th of all elements matching the selector.
    pub async fn click<D: Driver>(&self, driver: &D, params: &ClickParams) -> Result<Value> {
        let selector = Selector::new(params.by, &params.selector);
        let budget = Duration::from_secs(params.timeout);
        let count = self.locator.count_within(driver, &selector, budget).await?;
        if params.index >= count {
            return Err(AutomationError::Validation(format!(
                "index out of range: {} (matched {count})",
                params.index
            )));
        }

        let mut last_fault = None;
        for mechanism in ClickMechanism::LADDER {
            let attempt = match mechanism {
                ClickMechanism::Native => driver.click_native(&selector, params.index).await,
                ClickMechanism::Scripted => driver.click_scripted(&selector, params.index).await,
            };
            match attempt {
                Ok(()) => {
                    return Ok(json!({
                        "selector": params.selector,
                        "index": params.index,
                    }))
                }
                Err(e) => {
                    debug!(mechanism = mechanism.name(), error = %e, "click mechanism failed");
                    last_fault = Some(e);
                }
            }
        }
        Err(AutomationError::Interaction(format!(
            "click exhausted all mechanisms: {}",
            last_fault.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    async fn attempt_type<D: Driver>(
        &self,
        driver: &D,
        element: &ResolvedElement,
        mechanism: TypeMechanism,
        text: &str,
    ) -> Result<()> {
        match mechanism {
            TypeMechanism::Native => {
                driver
                    .type_native(&element.selector, element.index, text)
                    .await
            }
            TypeMechanism::CharByChar => {
                for ch in text.chars() {
                    driver.type_char(&element.selector, element.index, ch).await?;
                    tokio::time::sleep(Duration::from_millis(self.timeouts.type_delay_ms)).await;
                }
                Ok(())
            }
            TypeMechanism::ScriptedValue => {
                driver
                    .set_value_scripted(&element.selector, element.index, text)
                    .await
            }
        }
    }

    /// Type into a resolved element. Whichever mechanism claims success, the
    /// visible field value must equal the target text afterwards; a mismatch
    /// sends the ladder to the next rung.
    pub async fn type_text<D: Driver>(&self, driver: &D, params: &TypeParams) -> Result<Value> {
        let selector = Selector::new(params.by, &params.selector);
        let budget = Duration::from_secs(params.timeout);
        let element = self
            .locator
            .resolve(driver, std::slice::from_ref(&selector), budget)
            .await?;

        let mut last_fault = None;
        for mechanism in TypeMechanism::LADDER {
            if let Err(e) = driver.clear_scripted(&element.selector, element.index).await {
                debug!(error = %e, "pre-type clear failed");
            }
            match self.attempt_type(driver, &element, mechanism, &params.text).await {
                Ok(()) => match driver.field_value(&element.selector, element.index).await {
                    Ok(value) if value == params.text => {
                        return Ok(json!({
                            "selector": params.selector,
                            "text": params.text,
                        }))
                    }
                    Ok(value) => {
                        debug!(
                            mechanism = mechanism.name(),
                            value = %value,
                            "typing left wrong field value"
                        );
                        last_fault = Some(AutomationError::Interaction(format!(
                            "{} typing left field value {value:?}",
                            mechanism.name()
                        )));
                    }
                    Err(e) => last_fault = Some(e),
                },
                Err(e) => {
                    debug!(mechanism = mechanism.name(), error = %e, "type mechanism failed");
                    last_fault = Some(e);
                }
            }
        }
        Err(AutomationError::Interaction(format!(
            "typing exhausted all mechanisms: {}",
            last_fault.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Rendered text of the first element the selector resolves to. Presence
    /// is enough here; hidden elements still carry readable text.
    pub async fn read<D: Driver>(&self, driver: &D, params: &ReadParams) -> Result<Value> {
        let selector = Selector::new(params.by, &params.selector);
        let budget = Duration::from_secs(params.timeout);
        let element = self
            .locator
            .resolve_present(driver, std::slice::from_ref(&selector), budget)
            .await?;
        let text = driver
            .read_text(&element.selector, element.index)
            .await
            .map_err(as_interaction)?;
        Ok(json!({ "text": text, "selector": params.selector }))
    }

    pub async fn scroll<D: Driver>(&self, driver: &D, params: &ScrollParams) -> Result<Value> {
        let delta = match params.direction {
            ScrollDirection::Up => -params.amount,
            ScrollDirection::Down => params.amount,
        };
        driver.scroll_by(delta).await.map_err(as_interaction)?;
        tokio::time::sleep(Duration::from_millis(self.timeouts.scroll_settle_ms)).await;
        Ok(json!({
            "direction": params.direction.name(),
            "amount": delta,
        }))
    }

    /// Presence-only wait: success means "found", not "usable".
    pub async fn wait<D: Driver>(&self, driver: &D, params: &WaitParams) -> Result<Value> {
        let selector = Selector::new(params.by, &params.selector);
        let budget = Duration::from_secs(params.timeout);
        self.locator
            .resolve_present(driver, std::slice::from_ref(&selector), budget)
            .await?;
        Ok(json!({ "selector": params.selector }))
    }

    /// Composite search pipeline. Search boxes are the highest-variance
    /// control across sites, so every stage carries its own ladder: an
    /// extended locator ladder, a triple clear, paced typing with a scripted
    /// fallback, and a three-rung submit.
    pub async fn search<D: Driver>(&self, driver: &D, params: &SearchParams) -> Result<Value> {
        let budget = self.default_budget();
        self.wait_for_ready_state(driver, budget).await?;
        // let late-arriving dynamic content settle before hunting for the box
        tokio::time::sleep(Duration::from_millis(self.timeouts.search_settle_ms)).await;

        let ladder = search_ladder(&params.search_box_selector);
        let element = self.locator.resolve(driver, &ladder, budget).await?;

        // inputs that resist one clearing method usually yield to another;
        // run all three and tolerate individual failures
        for mechanism in ClearMechanism::ALL {
            let attempt = match mechanism {
                ClearMechanism::Native => {
                    driver.clear_native(&element.selector, element.index).await
                }
                ClearMechanism::ScriptedReset => {
                    driver.clear_scripted(&element.selector, element.index).await
                }
                ClearMechanism::SelectAllDelete => {
                    driver.clear_with_keys(&element.selector, element.index).await
                }
            };
            if let Err(e) = attempt {
                debug!(mechanism = mechanism.name(), error = %e, "clear mechanism failed");
            }
        }

        match self
            .attempt_type(driver, &element, TypeMechanism::CharByChar, &params.query)
            .await
        {
            Ok(()) => {}
            Err(e) => {
                warn!(error = %e, "paced typing failed, falling back to scripted value");
                driver
                    .set_value_scripted(&element.selector, element.index, &params.query)
                    .await
                    .map_err(as_interaction)?;
            }
        }

        let mut submitted = false;
        let mut last_fault = None;
        for mechanism in SubmitMechanism::LADDER {
            let attempt = match mechanism {
                SubmitMechanism::EnterKey => {
                    driver.press_enter(&element.selector, element.index).await
                }
                SubmitMechanism::SubmitButton => driver.click_submit_control().await,
                SubmitMechanism::ScriptedForm => {
                    driver
                        .submit_form_scripted(&element.selector, element.index)
                        .await
                }
            };
            match attempt {
                Ok(()) => {
                    submitted = true;
                    break;
                }
                Err(e) => {
                    debug!(mechanism = mechanism.name(), error = %e, "submit mechanism failed");
                    last_fault = Some(e);
                }
            }
        }
        if !submitted {
            return Err(AutomationError::Interaction(format!(
                "failed to submit search: {}",
                last_fault.map(|e| e.to_string()).unwrap_or_default()
            )));
        }

        self.wait_for_ready_state(driver, budget).await?;
        let url = driver.current_url().await.map_err(as_interaction)?;
        Ok(json!({ "query": params.query, "url": url }))
    }

    /// Fill fields in caller order, aborting at the first fault and
    /// reporting how far execution got.
    pub async fn fill_form<D: Driver>(&self, driver: &D, params: &FillFormParams) -> FillReport {
        let budget = Duration::from_secs(params.timeout);
        let mut completed = Vec::new();

        for (field, value) in &params.fields {
            let text = match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            };
            match self.fill_one(driver, field, &text, budget).await {
                Ok(()) => completed.push(field.clone()),
                Err(e) => {
                    warn!(field = %field, error = %e, "form fill aborted");
                    return FillReport {
                        completed,
                        failed: Some((field.clone(), e)),
                    };
                }
            }
        }
        FillReport {
            completed,
            failed: None,
        }
    }

    async fn fill_one<D: Driver>(
        &self,
        driver: &D,
        field: &str,
        text: &str,
        budget: Duration,
    ) -> Result<()> {
        let selector = Selector::css(field);
        let element = self
            .locator
            .resolve_present(driver, std::slice::from_ref(&selector), budget)
            .await?;
        if let Err(e) = driver.clear_scripted(&element.selector, element.index).await {
            debug!(field = %field, error = %e, "pre-fill clear failed");
        }
        match driver
            .type_native(&element.selector, element.index, text)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                debug!(field = %field, error = %e, "native fill failed, using scripted value");
                driver
                    .set_value_scripted(&element.selector, element.index, text)
                    .await
                    .map_err(as_interaction)
            }
        }
    }
}
