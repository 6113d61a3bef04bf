//! Error types for the packet protocol.

use crate::id::{ComponentName, GroupLabel, PortName};
use thiserror::Error;

/// Protocol violations in the bracket structure of a stream.
///
/// These describe upstream producer bugs, never values the wrapped
/// callable saw, so they are kept apart from invocation failures.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// A close bracket arrived while no bracket was open on the port.
    #[error("close bracket `{group}` on port `{port}` has no matching open bracket")]
    UnmatchedClose {
        /// Port the close bracket arrived on.
        port: PortName,
        /// Group label carried by the offending close bracket.
        group: GroupLabel,
    },
}

/// Errors posting to or subscribing on a port.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum PortError {
    /// The component declares no in-port with that name.
    #[error("unknown in-port: {0}")]
    UnknownInPort(PortName),

    /// The component declares no out-port with that name.
    #[error("unknown out-port: {0}")]
    UnknownOutPort(PortName),

    /// The packet broke the bracket structure and was not accepted.
    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// The component is no longer running.
    #[error("component stopped; packet on `{0}` dropped")]
    Stopped(PortName),
}

/// Errors wiring sockets to ports.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SocketError {
    /// The socket already has a producer attached.
    #[error("socket already has a producer")]
    ProducerAttached,

    /// The socket already has a consumer attached.
    #[error("socket already has a consumer")]
    ConsumerAttached,

    /// The port refused the attachment.
    #[error("port error: {0}")]
    Port(#[from] PortError),

    /// Attaching a consumer needs a Tokio runtime to run the delivery task.
    #[error("no tokio runtime available to deliver socket packets")]
    NoRuntime,
}

/// Errors creating component instances.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ComponentError {
    /// Component instances run a task and need a Tokio runtime.
    #[error("no tokio runtime available to run component `{0}`")]
    NoRuntime(String),

    /// The declaration is inconsistent (duplicate port names and the like).
    #[error("invalid component declaration: {0}")]
    InvalidDeclaration(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors resolving a component name to an instance.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoadError {
    /// No component is registered under that name.
    #[error("component not found: {0}")]
    NotFound(ComponentName),

    /// The factory failed to produce an instance.
    #[error("failed to instantiate {name}: {source}")]
    Instantiate {
        /// Component being instantiated.
        name: ComponentName,
        /// Underlying failure.
        #[source]
        source: ComponentError,
    },

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}
