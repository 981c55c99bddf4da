use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level status carried in every response body.
///
/// Anything other than `"success"` counts as an error, so unknown values
/// decode to [`ApiStatus::Error`] instead of failing the whole body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ApiStatus {
    Success,
    Error,
}

impl ApiStatus {
    pub fn is_success(self) -> bool {
        self == ApiStatus::Success
    }
}

impl From<String> for ApiStatus {
    fn from(value: String) -> Self {
        if value == "success" {
            ApiStatus::Success
        } else {
            ApiStatus::Error
        }
    }
}

impl From<ApiStatus> for String {
    fn from(value: ApiStatus) -> Self {
        match value {
            ApiStatus::Success => "success".to_string(),
            ApiStatus::Error => "error".to_string(),
        }
    }
}

/// A well-formed response that explicitly reported `status: "error"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("application error: {}", .message.as_deref().unwrap_or("<no message>"))]
pub struct ApplicationError {
    pub message: Option<String>,
}

impl ApplicationError {
    pub fn new(message: Option<String>) -> Self {
        let message = message.filter(|m| !m.trim().is_empty());
        Self { message }
    }
}
