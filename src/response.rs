//! Uniform response envelope. Every command, whatever its fate, is
//! answered with the same shape so callers can branch on `status` alone.

use crate::errors::AutomationError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub status: Status,
    pub action: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    pub fn success(action: &str, message: impl Into<String>, data: Value) -> Self {
        Self {
            status: Status::Success,
            action: action.to_string(),
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(action: &str, err: &AutomationError) -> Self {
        Self {
            status: Status::Error,
            action: action.to_string(),
            message: err.to_string(),
            data: None,
            error: Some(ErrorBody {
                kind: err.kind(),
                detail: err.to_string(),
            }),
        }
    }

    /// Failure that still carries partial progress, e.g. a form fill that
    /// completed some fields before faulting.
    pub fn failure_with_progress(action: &str, err: &AutomationError, progress: Value) -> Self {
        let mut response = Self::failure(action, err);
        response.data = Some(progress);
        response
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}
