//! Invoke a component as a single asynchronous call.

use crate::args::CallArgs;
use crate::config::{BridgeConfig, ResultShape};
use crate::error::BridgeError;
use rill_adapter::InvocationError;
use rill_core::{
    Component, ComponentLoader, ComponentName, Ip, IpHandler, PortName, StructuralError,
};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::Instrument;

/// Completion of a bridged call.
pub type CallResult = Result<Value, BridgeError>;

/// Loads components by name and runs them like functions.
///
/// Each call loads a fresh instance, posts the arguments, listens on every
/// out-port and resolves once: the first data on `error` fails the call,
/// data on every success port completes it. Brackets are ignored.
#[derive(Clone)]
pub struct CallbackBridge {
    loader: Arc<dyn ComponentLoader>,
    config: BridgeConfig,
}

impl CallbackBridge {
    /// Create a bridge with the default configuration.
    pub fn new(loader: Arc<dyn ComponentLoader>) -> Self {
        Self {
            loader,
            config: BridgeConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Call a component and wait for its result.
    pub async fn call(
        &self,
        name: impl Into<ComponentName>,
        args: impl Into<CallArgs>,
    ) -> CallResult {
        let name = name.into();
        let span = tracing::info_span!("bridge.call", component = %name);
        self.run(name, args.into()).instrument(span).await
    }

    /// Call a component and hand the result to `completion`, exactly once.
    ///
    /// Returns immediately; the call runs on the current Tokio runtime.
    pub fn invoke<F>(&self, name: impl Into<ComponentName>, args: impl Into<CallArgs>, completion: F)
    where
        F: FnOnce(CallResult) + Send + 'static,
    {
        let bridge = self.clone();
        let name = name.into();
        let args = args.into();
        tokio::spawn(async move { completion(bridge.call(name, args).await) });
    }

    /// A reusable function bound to one component name.
    pub fn as_callback(
        &self,
        name: impl Into<ComponentName>,
    ) -> impl Fn(CallArgs, Box<dyn FnOnce(CallResult) + Send>) + Send + Sync + 'static {
        let bridge = self.clone();
        let name = name.into();
        move |args, completion| bridge.invoke(name.clone(), args, completion)
    }

    async fn run(&self, name: ComponentName, args: CallArgs) -> CallResult {
        let instance = self.loader.load(&name).await?;
        let shape = match (self.config.result_shape, args.is_named()) {
            (ResultShape::MirrorInput, true) => Shape::Mapping,
            _ => Shape::Auto,
        };
        let bound = args.bind(instance.descriptor())?;
        let rx = listen(instance.as_ref(), shape)?;
        tracing::debug!(inputs = bound.len(), "posting arguments");
        instance.post_batch(bound)?;

        let outcome = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit.into(), rx)
                .await
                .map_err(|_| BridgeError::TimedOut(limit))?,
            None => rx.await,
        };
        // The instance must outlive the wait; its handlers hold the sender.
        drop(instance);
        let result = outcome.unwrap_or(Err(BridgeError::Abandoned));
        match &result {
            Ok(_) => tracing::debug!("call resolved"),
            Err(e) => tracing::debug!(error = %e, "call failed"),
        }
        result
    }
}

#[derive(Clone, Copy)]
enum Shape {
    Auto,
    Mapping,
}

/// Gathers out-port data until the call can resolve.
struct Collector {
    done: Option<oneshot::Sender<CallResult>>,
    expected: Vec<PortName>,
    received: Map<String, Value>,
    shape: Shape,
}

impl Collector {
    fn resolve(&mut self, result: CallResult) {
        if let Some(done) = self.done.take() {
            let _ = done.send(result);
        }
    }

    fn success(&mut self, port: &PortName, value: Value) {
        if self.done.is_none() || self.received.contains_key(port.as_str()) {
            return;
        }
        self.received.insert(port.to_string(), value);
        if self.received.len() < self.expected.len() {
            return;
        }
        let result = match (self.shape, self.expected.as_slice()) {
            (Shape::Auto, [only]) => self.received.remove(only.as_str()).unwrap_or_default(),
            _ => Value::Object(std::mem::take(&mut self.received)),
        };
        self.resolve(Ok(result));
    }
}

fn listen(
    component: &dyn Component,
    shape: Shape,
) -> Result<oneshot::Receiver<CallResult>, BridgeError> {
    let descriptor = component.descriptor();
    let (tx, rx) = oneshot::channel();
    let collector = Arc::new(Mutex::new(Collector {
        done: Some(tx),
        expected: descriptor
            .success_ports()
            .map(|p| p.name.clone())
            .collect(),
        received: Map::new(),
        shape,
    }));

    for port in &descriptor.out_ports {
        let collector = Arc::clone(&collector);
        let name = port.name.clone();
        let handler: IpHandler = if port.is_error() {
            Arc::new(move |ip: &Ip| {
                if let Some(payload) = ip.payload() {
                    lock(&collector).resolve(Err(BridgeError::Invocation(
                        InvocationError::from_payload(payload),
                    )));
                }
            })
        } else {
            Arc::new(move |ip: &Ip| {
                if let Some(payload) = ip.payload() {
                    lock(&collector).success(&name, payload.clone());
                }
            })
        };
        component.on_ip(port.name.as_str(), handler)?;
    }

    let collector = Arc::clone(&collector);
    component.on_structural_error(Arc::new(move |e: &StructuralError| {
        lock(&collector).resolve(Err(BridgeError::Structural(e.clone())));
    }));
    Ok(rx)
}

fn lock(collector: &Mutex<Collector>) -> std::sync::MutexGuard<'_, Collector> {
    collector
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
