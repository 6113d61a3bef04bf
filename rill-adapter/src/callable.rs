//! The three supported calling conventions behind one type.

use crate::error::InvocationError;
use crate::signature::{Args, Convention};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Result of one invocation before it is turned into packets.
pub type Outcome = Result<Value, InvocationError>;

/// A synchronous callable.
pub type SyncFn = dyn Fn(Args) -> Outcome + Send + Sync;
/// A callable returning a future.
pub type PromiseFn = dyn Fn(Args) -> BoxFuture<'static, Outcome> + Send + Sync;
/// A callable that reports through a [`Completion`].
pub type CallbackFn = dyn Fn(Args, Completion) + Send + Sync;

/// A wrapped callable. The variant is the calling convention.
#[derive(Clone)]
pub enum Callable {
    /// Returns directly.
    Sync(Arc<SyncFn>),
    /// Returns a future.
    Promise(Arc<PromiseFn>),
    /// Calls a completion.
    Callback(Arc<CallbackFn>),
}

impl Callable {
    /// The calling convention.
    pub fn convention(&self) -> Convention {
        match self {
            Callable::Sync(_) => Convention::Sync,
            Callable::Promise(_) => Convention::Promise,
            Callable::Callback(_) => Convention::NodeCallback,
        }
    }
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callable({})", self.convention())
    }
}

/// The completion handed to callback-style callables.
///
/// Consumed on use, so it resolves at most once. Dropping it without a
/// call is reported on the `error` out-port.
pub struct Completion {
    results: Arc<[String]>,
    tx: oneshot::Sender<Outcome>,
}

impl Completion {
    pub(crate) fn new(results: Arc<[String]>) -> (Self, oneshot::Receiver<Outcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { results, tx }, rx)
    }

    /// Succeed with a single value.
    pub fn resolve(self, value: impl Into<Value>) {
        self.finish(Ok(value.into()));
    }

    /// Fail.
    pub fn reject(self, error: impl Into<InvocationError>) {
        self.finish(Err(error.into()));
    }

    /// Node-style completion: an error, or zero or more results.
    ///
    /// No result becomes `null`, one result is the payload itself, and
    /// several results become an object keyed by the declared result names
    /// (an array when no names were declared). Several results whose count
    /// differs from the declared names fail the invocation.
    pub fn call(self, error: Option<InvocationError>, results: Vec<Value>) {
        let outcome = match error {
            Some(e) => Err(e),
            None => pack_results(&self.results, results),
        };
        self.finish(outcome);
    }

    fn finish(self, outcome: Outcome) {
        // The receiver is gone only if the component was dropped.
        let _ = self.tx.send(outcome);
    }
}

fn pack_results(names: &[String], mut results: Vec<Value>) -> Outcome {
    match results.len() {
        0 => Ok(Value::Null),
        1 => Ok(results.remove(0)),
        _ if names.is_empty() => Ok(Value::Array(results)),
        n if n != names.len() => Err(InvocationError::new(format!(
            "expected {} results ({}), got {n}",
            names.len(),
            names.join(", ")
        ))),
        _ => Ok(Value::Object(names.iter().cloned().zip(results).collect::<Map<_, _>>())),
    }
}

/// Describe a caught panic payload.
pub(crate) fn panic_error(payload: Box<dyn Any + Send>) -> InvocationError {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    InvocationError::new(format!("callable panicked: {detail}"))
}
