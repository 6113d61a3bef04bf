//! Bridge errors.

use crate::config::DurationMs;
use rill_adapter::InvocationError;
use rill_core::{LoadError, PortError, StructuralError};
use thiserror::Error;

/// Why a bridged call did not produce a result.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The component could not be loaded.
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// The component reported a failure on its `error` port.
    #[error("{0}")]
    Invocation(InvocationError),

    /// The arguments broke the bracket structure.
    #[error("structural error: {0}")]
    Structural(StructuralError),

    /// Posting the arguments failed.
    #[error("port error: {0}")]
    Port(PortError),

    /// The arguments do not fit the component's in-ports.
    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),

    /// No result arrived within the configured timeout.
    #[error("no result within {}ms", .0.as_millis())]
    TimedOut(DurationMs),

    /// The component went away before resolving.
    #[error("component stopped before producing a result")]
    Abandoned,
}

impl From<PortError> for BridgeError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::Structural(s) => BridgeError::Structural(s),
            other => BridgeError::Port(other),
        }
    }
}

impl From<InvocationError> for BridgeError {
    fn from(e: InvocationError) -> Self {
        BridgeError::Invocation(e)
    }
}

impl BridgeError {
    /// The invocation failure, if that is what this is.
    pub fn as_invocation(&self) -> Option<&InvocationError> {
        match self {
            BridgeError::Invocation(e) => Some(e),
            _ => None,
        }
    }
}
