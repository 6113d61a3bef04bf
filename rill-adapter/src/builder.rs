//! Declaring adapted functions.

use crate::callable::{Callable, Completion, Outcome};
use crate::component::FunctionComponent;
use crate::error::{AdapterError, InvocationError};
use crate::signature::{Args, Convention, Param, Signature};
use futures::FutureExt;
use futures::future::BoxFuture;
use rill_core::{Component, ComponentDescriptor, ComponentError, ComponentFactory, PortName};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Collects parameters and results, then wraps a callable.
///
/// ```
/// use rill_adapter::{FunctionAdapter, InvocationError};
///
/// let greet = FunctionAdapter::builder()
///     .param("name")
///     .param_with_default("greeting", "Hello")
///     .sync(|args| Ok::<_, InvocationError>(format!("{} {}", args.text(1), args.text(0))))
///     .unwrap();
/// assert_eq!(greet.descriptor().in_port_names(), vec!["name", "greeting"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AdapterBuilder {
    description: Option<String>,
    params: Vec<Param>,
    results: Option<Vec<PortName>>,
}

impl AdapterBuilder {
    /// Start an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Describe the component.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a required parameter.
    pub fn param(mut self, name: impl Into<PortName>) -> Self {
        self.params.push(Param::required(name));
        self
    }

    /// Add an optional parameter with a default value.
    pub fn param_with_default(mut self, name: impl Into<PortName>, default: impl Into<Value>) -> Self {
        self.params.push(Param::with_default(name, default));
        self
    }

    /// Add several required parameters.
    pub fn params<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<PortName>,
    {
        self.params.extend(names.into_iter().map(Param::required));
        self
    }

    /// Declare named results. Each becomes an out-port in place of `out`,
    /// and object-shaped results are split across them.
    pub fn results<I, N>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<PortName>,
    {
        self.results = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Wrap a function that returns its result directly.
    pub fn sync<F, R>(self, f: F) -> Result<FunctionAdapter, AdapterError>
    where
        F: Fn(Args) -> Result<R, InvocationError> + Send + Sync + 'static,
        R: Into<Value> + 'static,
    {
        let callable = Callable::Sync(Arc::new(move |args: Args| -> Outcome {
            f(args).map(Into::into)
        }));
        self.wrap(callable)
    }

    /// Wrap a function that returns a future.
    pub fn promise<F, Fut, R>(self, f: F) -> Result<FunctionAdapter, AdapterError>
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, InvocationError>> + Send + 'static,
        R: Into<Value> + 'static,
    {
        let callable = Callable::Promise(Arc::new(move |args: Args| -> BoxFuture<'static, Outcome> {
            f(args)
                .map(|r: Result<R, InvocationError>| -> Outcome { r.map(Into::into) })
                .boxed()
        }));
        self.wrap(callable)
    }

    /// Wrap a function that reports through a [`Completion`].
    pub fn callback<F>(self, f: F) -> Result<FunctionAdapter, AdapterError>
    where
        F: Fn(Args, Completion) + Send + Sync + 'static,
    {
        self.wrap(Callable::Callback(Arc::new(f)))
    }

    /// Wrap an already type-erased callable.
    pub fn wrap(self, callable: Callable) -> Result<FunctionAdapter, AdapterError> {
        let signature = Signature::new(self.params, self.results, callable.convention())?;
        let mut descriptor = signature.descriptor()?;
        descriptor.description = self.description;
        Ok(FunctionAdapter {
            signature: Arc::new(signature),
            callable,
            descriptor,
        })
    }
}

/// A wrapped function: fixed ports plus the callable behind them.
///
/// Cheap to clone; every [`instantiate`](Self::instantiate) starts an
/// independent component.
#[derive(Debug, Clone)]
pub struct FunctionAdapter {
    signature: Arc<Signature>,
    callable: Callable,
    descriptor: ComponentDescriptor,
}

impl FunctionAdapter {
    /// Start a declaration.
    pub fn builder() -> AdapterBuilder {
        AdapterBuilder::new()
    }

    /// The declared signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The calling convention, fixed at wrap time.
    pub fn convention(&self) -> Convention {
        self.signature.convention
    }

    /// The port declaration.
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    /// Start a component on the current Tokio runtime.
    pub fn instantiate(&self) -> Result<Arc<FunctionComponent>, ComponentError> {
        FunctionComponent::spawn(
            Arc::clone(&self.signature),
            self.callable.clone(),
            self.descriptor.clone(),
        )
    }

    /// This adapter as a shareable factory.
    pub fn into_factory(self) -> Arc<dyn ComponentFactory> {
        Arc::new(self)
    }
}

impl ComponentFactory for FunctionAdapter {
    fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    fn create(&self) -> Result<Arc<dyn Component>, ComponentError> {
        let component: Arc<dyn Component> = self.instantiate()?;
        Ok(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hello(args: Args) -> Result<String, InvocationError> {
        Ok(format!("Hello {}", args.text(0)))
    }

    #[test]
    fn rewrapping_gives_identical_descriptors() {
        let a = FunctionAdapter::builder().param("hello").sync(hello).unwrap();
        let b = FunctionAdapter::builder().param("hello").sync(hello).unwrap();
        assert_eq!(a.descriptor(), b.descriptor());
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn convention_follows_wrapping_method() {
        let sync = FunctionAdapter::builder().sync(|_| Ok(json!(1))).unwrap();
        let promise = FunctionAdapter::builder()
            .promise(|_| async { Ok(json!(1)) })
            .unwrap();
        let callback = FunctionAdapter::builder()
            .callback(|_, done| done.resolve(1))
            .unwrap();
        assert_eq!(sync.convention(), Convention::Sync);
        assert_eq!(promise.convention(), Convention::Promise);
        assert_eq!(callback.convention(), Convention::NodeCallback);
    }

    #[test]
    fn completion_slot_is_not_a_port() {
        let a = FunctionAdapter::builder()
            .param("hello")
            .callback(|_, done| done.resolve("x"))
            .unwrap();
        assert_eq!(a.descriptor().in_port_names(), vec!["hello"]);
        assert_eq!(a.descriptor().out_port_names(), vec!["out", "error"]);
    }

    #[test]
    fn description_is_carried() {
        let a = FunctionAdapter::builder()
            .describe("greets")
            .sync(|_| Ok(Value::Null))
            .unwrap();
        assert_eq!(a.descriptor().description.as_deref(), Some("greets"));
    }

    #[test]
    fn instantiate_needs_a_runtime() {
        let a = FunctionAdapter::builder().sync(|_| Ok(Value::Null)).unwrap();
        assert!(matches!(a.instantiate(), Err(ComponentError::NoRuntime(_))));
    }
}
