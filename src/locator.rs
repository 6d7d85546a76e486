//! Multi-strategy element resolution.
//!
//! Real pages expose the same logical control under different selectors
//! depending on layout variant or locale, so resolution walks a ranked
//! ladder of candidate strategies instead of a single lookup. Each strategy
//! gets a slice of the total budget; the whole resolution is bounded by
//! roughly the budget regardless of how many candidates there are.

use crate::driver::Driver;
use crate::errors::{AutomationError, Result};
use crate::types::Selector;
use std::time::{Duration, Instant};
use tracing::debug;

/// A live element: the strategy that matched it plus its match index.
/// Valid only for the lifetime of the current page load.
#[derive(Debug, Clone)]
pub struct ResolvedElement {
    pub selector: Selector,
    pub index: usize,
}

pub struct Locator {
    poll_interval: Duration,
    min_slice: Duration,
}

impl Locator {
    pub fn new(poll_interval_ms: u64, min_slice_ms: u64) -> Self {
        Self {
            poll_interval: Duration::from_millis(poll_interval_ms),
            min_slice: Duration::from_millis(min_slice_ms),
        }
    }

    /// Resolve the first strategy yielding an interactable element: present
    /// in the DOM, visible, and enabled. The winner is scrolled into the
    /// viewport and focused before being returned.
    pub async fn resolve<D: Driver>(
        &self,
        driver: &D,
        strategies: &[Selector],
        budget: Duration,
    ) -> Result<ResolvedElement> {
        self.resolve_with(driver, strategies, budget, true).await
    }

    /// Presence-only resolution; "found" here does not mean "usable".
    pub async fn resolve_present<D: Driver>(
        &self,
        driver: &D,
        strategies: &[Selector],
        budget: Duration,
    ) -> Result<ResolvedElement> {
        self.resolve_with(driver, strategies, budget, false).await
    }

    /// Wait for at least one match of `selector` to be present, then report
    /// how many there are. Used by actions that index into a match list.
    pub async fn count_within<D: Driver>(
        &self,
        driver: &D,
        selector: &Selector,
        budget: Duration,
    ) -> Result<usize> {
        let deadline = Instant::now() + budget;
        let mut last_fault = String::new();
        loop {
            match driver.count_matches(selector).await {
                Ok(0) => {}
                Ok(count) => return Ok(count),
                Err(e) => last_fault = e.to_string(),
            }
            if Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
        Err(AutomationError::ElementNotFound(if last_fault.is_empty() {
            format!("no elements matching {}", selector.describe())
        } else {
            format!(
                "no elements matching {}: {last_fault}",
                selector.describe()
            )
        }))
    }

    async fn resolve_with<D: Driver>(
        &self,
        driver: &D,
        strategies: &[Selector],
        budget: Duration,
        require_interactable: bool,
    ) -> Result<ResolvedElement> {
        if strategies.is_empty() {
            return Err(AutomationError::Validation(
                "no locator strategies supplied".to_string(),
            ));
        }

        let start = Instant::now();
        let global_deadline = start + budget;
        let slice = (budget / strategies.len() as u32).max(self.min_slice);
        let mut last_fault = String::new();

        for selector in strategies {
            // Every strategy gets at least one immediate probe, even when an
            // earlier slice overran the global deadline.
            let slice_deadline = (Instant::now() + slice).min(global_deadline);
            loop {
                match driver.probe(selector, 0).await {
                    Ok(probe) if probe.present && !require_interactable => {
                        return Ok(ResolvedElement {
                            selector: selector.clone(),
                            index: 0,
                        });
                    }
                    Ok(probe) if probe.interactable() => {
                        return self.finish(driver, selector).await;
                    }
                    Ok(probe) if probe.present => {
                        last_fault = format!(
                            "{} present but not interactable (visible={}, enabled={})",
                            selector.describe(),
                            probe.visible,
                            probe.enabled
                        );
                    }
                    Ok(_) => {
                        last_fault = format!("{} not present", selector.describe());
                    }
                    Err(e) => {
                        last_fault = e.to_string();
                    }
                }
                if Instant::now() >= slice_deadline {
                    break;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
            debug!(strategy = %selector.describe(), fault = %last_fault, "locator strategy exhausted its slice");
        }

        Err(AutomationError::ElementNotFound(format!(
            "no strategy yielded an element within {}ms; last fault: {last_fault}",
            budget.as_millis()
        )))
    }

    /// Bring the matched element into the viewport and give it focus. Focus
    /// is best-effort: some matchable elements refuse it without that being
    /// a resolution failure.
    async fn finish<D: Driver>(&self, driver: &D, selector: &Selector) -> Result<ResolvedElement> {
        driver.scroll_into_view(selector, 0).await?;
        if let Err(e) = driver.focus(selector, 0).await {
            debug!(strategy = %selector.describe(), error = %e, "focus attempt failed");
        }
        Ok(ResolvedElement {
            selector: selector.clone(),
            index: 0,
        })
    }
}
