#![deny(missing_docs)]
//! # rill: umbrella crate
//!
//! One import surface for the rill crates. Re-exports each crate behind a
//! feature flag, plus a `prelude` for wiring functions into components and
//! calling them.

#[cfg(feature = "adapter")]
pub use rill_adapter;
#[cfg(feature = "bridge")]
pub use rill_bridge;
#[cfg(feature = "core")]
pub use rill_core;

/// Happy-path imports.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use rill_core::{
        Component, ComponentDescriptor, ComponentFactory, ComponentLoader, ComponentName,
        ERROR_PORT, GroupLabel, IN_PORT, Ip, IpKind, OUT_PORT, PortName, PortSpec, Socket,
        StructuralError,
    };

    #[cfg(feature = "adapter")]
    pub use rill_adapter::{
        AdapterBuilder, Args, Completion, Convention, FunctionAdapter, FunctionComponent,
        InvocationError,
    };

    #[cfg(feature = "bridge")]
    pub use rill_bridge::{
        BridgeConfig, BridgeError, CallArgs, CallbackBridge, DurationMs, ResultShape,
    };
}
