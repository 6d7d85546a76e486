use serde::{Deserialize, Serialize};

/// The fixed set of actions this core executes. The wire format carries the
/// action as a string; `Action::parse` is the single place an unknown name
/// is rejected, after which dispatch is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Navigate,
    Click,
    Type,
    Read,
    Scroll,
    Wait,
    Search,
    FillForm,
}

impl Action {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "navigate" => Some(Action::Navigate),
            "click" => Some(Action::Click),
            "type" => Some(Action::Type),
            "read" => Some(Action::Read),
            "scroll" => Some(Action::Scroll),
            "wait" => Some(Action::Wait),
            "search" => Some(Action::Search),
            "fill_form" => Some(Action::FillForm),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Navigate => "navigate",
            Action::Click => "click",
            Action::Type => "type",
            Action::Read => "read",
            Action::Scroll => "scroll",
            Action::Wait => "wait",
            Action::Search => "search",
            Action::FillForm => "fill_form",
        }
    }
}

/// Wire-level command as produced by the intent-classification collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub action: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Selector kinds supported by the locator. Aliases match the names the
/// original WebDriver-style callers emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    #[serde(alias = "css selector")]
    Css,
    Name,
    #[serde(alias = "tag name")]
    Tag,
    XPath,
}

/// One candidate way of identifying a logical element on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub kind: SelectorKind,
    pub value: String,
}

impl Selector {
    pub fn new(kind: SelectorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn css(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Css, value)
    }

    pub fn name(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Name, value)
    }

    pub fn tag(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::Tag, value)
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Self::new(SelectorKind::XPath, value)
    }

    /// CSS equivalent for kinds that have one; `name` and `tag` selectors
    /// canonicalize to CSS, xpath does not.
    pub fn as_css(&self) -> Option<String> {
        match self.kind {
            SelectorKind::Css => Some(self.value.clone()),
            SelectorKind::Name => Some(format!("[name=\"{}\"]", self.value)),
            SelectorKind::Tag => Some(self.value.clone()),
            SelectorKind::XPath => None,
        }
    }

    pub fn describe(&self) -> String {
        let kind = match self.kind {
            SelectorKind::Css => "css",
            SelectorKind::Name => "name",
            SelectorKind::Tag => "tag",
            SelectorKind::XPath => "xpath",
        };
        format!("{} '{}'", kind, self.value)
    }
}

fn default_by() -> SelectorKind {
    SelectorKind::Css
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_scroll_amount() -> i64 {
    300
}

fn default_search_box() -> String {
    "input[name=\"q\"]".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigateParams {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClickParams {
    pub selector: String,
    #[serde(default = "default_by")]
    pub by: SelectorKind,
    #[serde(default)]
    pub index: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeParams {
    pub selector: String,
    pub text: String,
    #[serde(default = "default_by")]
    pub by: SelectorKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadParams {
    pub selector: String,
    #[serde(default = "default_by")]
    pub by: SelectorKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

impl Default for ScrollDirection {
    fn default() -> Self {
        ScrollDirection::Down
    }
}

impl ScrollDirection {
    pub fn name(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollParams {
    #[serde(default)]
    pub direction: ScrollDirection,
    #[serde(default = "default_scroll_amount")]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaitParams {
    pub selector: String,
    #[serde(default = "default_by")]
    pub by: SelectorKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_search_box")]
    pub search_box_selector: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillFormParams {
    /// Field selector → value, filled in caller-supplied order.
    pub fields: serde_json::Map<String, serde_json::Value>,
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Budget for waits not covered by a per-command timeout.
    pub default_ms: u64,
    /// Interval between condition polls.
    pub poll_interval_ms: u64,
    /// Minimum per-strategy slice of a resolution budget.
    pub min_strategy_slice_ms: u64,
    /// Inter-character delay for paced typing.
    pub type_delay_ms: u64,
    /// Settle time after a scroll, letting lazy content load.
    pub scroll_settle_ms: u64,
    /// Settle time after page readiness before hunting for a search box.
    pub search_settle_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_ms: 10_000,
            poll_interval_ms: 50,
            min_strategy_slice_ms: 100,
            type_delay_ms: 100,
            scroll_settle_ms: 500,
            search_settle_ms: 2_000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutomationConfig {
    pub browser: BrowserConfig,
    pub timeouts: TimeoutConfig,
}
