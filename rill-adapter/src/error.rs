//! Adapter errors.

use rill_core::ComponentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A failure inside the wrapped callable.
///
/// Raised by returning `Err`, rejecting a future, completing a callback
/// with an error, or panicking. It travels as a data packet on the
/// `error` out-port and never halts the component.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct InvocationError {
    /// Description of the failure.
    pub message: String,
}

impl InvocationError {
    /// Create an error with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Describe any error value.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        Self::new(error.to_string())
    }

    /// The payload carried on the `error` out-port.
    pub fn to_payload(&self) -> Value {
        serde_json::json!({ "message": self.message })
    }

    /// Read an `error` out-port payload back.
    ///
    /// Accepts the object shape written by [`to_payload`](Self::to_payload),
    /// a bare string, or any other value (rendered as JSON).
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::Object(map) => match map.get("message") {
                Some(Value::String(message)) => Self::new(message.clone()),
                _ => Self::new(payload.to_string()),
            },
            Value::String(message) => Self::new(message.clone()),
            other => Self::new(other.to_string()),
        }
    }
}

impl From<String> for InvocationError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for InvocationError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for InvocationError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("invalid argument: {e}"))
    }
}

/// Errors declaring an adapted function.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Two parameters share a name.
    #[error("duplicate parameter: {0}")]
    DuplicateParam(String),

    /// Two results share a name.
    #[error("duplicate result: {0}")]
    DuplicateResult(String),

    /// A result would shadow the error out-port.
    #[error("result name `{0}` is reserved")]
    ReservedResult(String),

    /// Named results were requested but none given.
    #[error("named results need at least one name")]
    EmptyResults,

    /// The resulting port declaration is invalid.
    #[error("component error: {0}")]
    Component(#[from] ComponentError),
}
