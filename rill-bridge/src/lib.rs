//! # rill-bridge: components as ordinary async calls
//!
//! [`CallbackBridge`] loads a component through a
//! [`ComponentLoader`](rill_core::ComponentLoader), feeds it one set of
//! arguments and resolves a single completion with the outcome.
//!
//! | Entry point | Returns |
//! |-------------|---------|
//! | [`CallbackBridge::call`] | a future of `Result<Value, BridgeError>` |
//! | [`CallbackBridge::invoke`] | nothing; the completion runs once on the runtime |
//! | [`CallbackBridge::as_callback`] | a reusable `(args, completion)` function for one component |
//!
//! A positional argument goes to the component's only in-port, or to its
//! only required in-port. Named arguments go to the in-ports they name.
//! A call whose required inputs are never all supplied does not resolve
//! unless [`BridgeConfig::timeout`] is set.

#![deny(missing_docs)]

pub mod args;
pub mod bridge;
pub mod config;
pub mod error;

pub use args::CallArgs;
pub use bridge::{CallResult, CallbackBridge};
pub use config::{BridgeConfig, DurationMs, ResultShape};
pub use error::BridgeError;
