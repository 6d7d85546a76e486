use thiserror::Error;

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("interaction failed: {0}")]
    Interaction(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl AutomationError {
    /// Stable machine-readable code for the response envelope's `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AutomationError::Validation(_) => "validation",
            AutomationError::Session(_) => "session",
            AutomationError::ElementNotFound(_) => "element_not_found",
            AutomationError::Interaction(_) => "interaction",
            AutomationError::Driver(_) => "driver",
        }
    }
}

pub type Result<T> = std::result::Result<T, AutomationError>;

// headless_chrome surfaces anyhow errors; keep `?` usable in the driver impl.
impl From<anyhow::Error> for AutomationError {
    fn from(err: anyhow::Error) -> Self {
        AutomationError::Driver(err.to_string())
    }
}
