//! # rill-adapter: ordinary functions as components
//!
//! Wrap a function once with an explicit signature and get a component
//! whose in-ports are its parameters and whose out-ports are its results
//! plus `error`.
//!
//! | Convention | Wrap with | Result delivered by |
//! |------------|-----------|---------------------|
//! | Sync | [`AdapterBuilder::sync`] | returning `Ok`/`Err` |
//! | Promise | [`AdapterBuilder::promise`] | the returned future |
//! | NodeCallback | [`AdapterBuilder::callback`] | calling the [`Completion`] |
//!
//! An activation fires once every required parameter has a value. Results
//! leave in the order activations fired, even when a later asynchronous
//! call finishes first. Brackets are forwarded to every out-port and keep
//! their position relative to the results around them.
//!
//! Failures never stop a component: they become `{"message": ...}`
//! packets on the `error` port.

#![deny(missing_docs)]

pub mod builder;
pub mod callable;
pub mod component;
pub mod error;
pub mod ordering;
pub mod signature;

pub use builder::{AdapterBuilder, FunctionAdapter};
pub use callable::{Callable, CallbackFn, Completion, Outcome, PromiseFn, SyncFn};
pub use component::FunctionComponent;
pub use error::{AdapterError, InvocationError};
pub use ordering::{Emission, OrderedEmitter};
pub use signature::{Args, Convention, Param, Signature};
