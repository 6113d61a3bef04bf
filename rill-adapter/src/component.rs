//! Running instances of adapted functions.
//!
//! Each instance owns one Tokio task, the only writer of the pending
//! activation buffer. `post` checks bracket structure under a small lock
//! and enqueues; the task buffers data, fires the callable, and emits
//! results through the [`OrderedEmitter`]. Asynchronous invocations run in
//! a `JoinSet` owned by the task, so several may be in flight at once while
//! their results still leave in arrival order.

use crate::callable::{Callable, Completion, Outcome, panic_error};
use crate::error::InvocationError;
use crate::ordering::{Emission, OrderedEmitter};
use crate::signature::{Args, Signature};
use futures::FutureExt;
use rill_core::{
    BracketForwarder, Component, ComponentDescriptor, ComponentError, ERROR_PORT, FaultListeners,
    Forward, IN_PORT, Ip, IpHandler, OUT_PORT, Outlets, PortError, PortName, Socket,
    StructuralErrorHandler,
};
use serde_json::Value;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

/// A packet accepted by `post`, already checked for bracket structure.
enum Inbound {
    Bracket(Ip),
    Data(PortName, Value),
}

/// A component driven by a wrapped callable.
pub struct FunctionComponent {
    descriptor: ComponentDescriptor,
    brackets: Mutex<BracketForwarder>,
    inbox: mpsc::UnboundedSender<Vec<Inbound>>,
    outlets: Arc<Outlets>,
    faults: FaultListeners,
}

impl FunctionComponent {
    /// Start an instance on the current Tokio runtime.
    pub fn spawn(
        signature: Arc<Signature>,
        callable: Callable,
        descriptor: ComponentDescriptor,
    ) -> Result<Arc<Self>, ComponentError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            ComponentError::NoRuntime(
                descriptor
                    .description
                    .clone()
                    .unwrap_or_else(|| "function".into()),
            )
        })?;
        let outlets = Arc::new(Outlets::new(&descriptor.out_ports));
        let (inbox, events) = mpsc::unbounded_channel();
        let activation = Activation::new(signature, callable, Arc::clone(&outlets));
        runtime.spawn(activation.run(events));
        Ok(Arc::new(Self {
            descriptor,
            brackets: Mutex::new(BracketForwarder::new()),
            inbox,
            outlets,
            faults: FaultListeners::new(),
        }))
    }

    fn accept(&self, batch: Vec<(PortName, Ip)>) -> Result<(), PortError> {
        if let Some((port, _)) = batch
            .iter()
            .find(|(port, _)| self.descriptor.in_port(port.as_str()).is_none())
        {
            return Err(PortError::UnknownInPort(port.clone()));
        }
        let mut brackets = self
            .brackets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Check the whole batch before committing any depth change.
        let mut scratch = brackets.clone();
        let mut accepted = Vec::with_capacity(batch.len());
        let mut last_port = None;
        for (port, ip) in batch {
            match scratch.observe(&port, ip) {
                Ok(Forward::Bracket(ip)) => accepted.push(Inbound::Bracket(ip)),
                Ok(Forward::Data(ip)) => {
                    let value = ip.into_payload().unwrap_or(Value::Null);
                    accepted.push(Inbound::Data(port.clone(), value));
                }
                Err(e) => {
                    drop(brackets);
                    self.faults.report(&e);
                    return Err(e.into());
                }
            }
            last_port = Some(port);
        }
        // Enqueue while holding the lock so queue order equals depth order.
        self.inbox
            .send(accepted)
            .map_err(|_| PortError::Stopped(last_port.unwrap_or_else(|| PortName::new(IN_PORT))))?;
        *brackets = scratch;
        Ok(())
    }
}

impl Component for FunctionComponent {
    fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    fn post(&self, port: &str, ip: Ip) -> Result<(), PortError> {
        self.accept(vec![(PortName::new(port), ip)])
    }

    /// The whole batch is buffered before activation is evaluated, so it
    /// fires at most once.
    fn post_batch(&self, batch: Vec<(PortName, Ip)>) -> Result<(), PortError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.accept(batch)
    }

    fn on_ip(&self, port: &str, handler: IpHandler) -> Result<(), PortError> {
        self.outlets.subscribe(port, handler)
    }

    fn on_structural_error(&self, handler: StructuralErrorHandler) {
        self.faults.subscribe(handler);
    }

    fn attach_out(&self, port: &str, socket: Socket) -> Result<(), PortError> {
        self.outlets.attach(port, socket)
    }

    fn detach_out(&self, port: &str, socket: &Socket) -> bool {
        self.outlets.detach(port, socket)
    }
}

/// State owned by the component task.
struct Activation {
    signature: Arc<Signature>,
    callable: Callable,
    param_names: Arc<[PortName]>,
    result_names: Arc<[String]>,
    pending: HashMap<PortName, Value>,
    emitter: OrderedEmitter,
    outlets: Arc<Outlets>,
}

impl Activation {
    fn new(signature: Arc<Signature>, callable: Callable, outlets: Arc<Outlets>) -> Self {
        let param_names: Arc<[PortName]> = signature.params.iter().map(|p| p.name.clone()).collect();
        let result_names: Arc<[String]> = signature
            .results
            .iter()
            .flatten()
            .map(ToString::to_string)
            .collect();
        Self {
            signature,
            callable,
            param_names,
            result_names,
            pending: HashMap::new(),
            emitter: OrderedEmitter::new(),
            outlets,
        }
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<Vec<Inbound>>) {
        let mut inflight: JoinSet<(u64, Outcome)> = JoinSet::new();
        let mut open = true;
        loop {
            tokio::select! {
                batch = inbox.recv(), if open => match batch {
                    Some(batch) => self.accept(batch, &mut inflight),
                    None => open = false,
                },
                Some(joined) = inflight.join_next(), if !inflight.is_empty() => match joined {
                    Ok((slot, outcome)) => self.settle(slot, outcome),
                    Err(e) => tracing::warn!(error = %e, "in-flight activation abandoned"),
                },
                else => break,
            }
        }
        tracing::trace!(outstanding = self.emitter.outstanding(), "component task finished");
    }

    fn accept(&mut self, batch: Vec<Inbound>, inflight: &mut JoinSet<(u64, Outcome)>) {
        let mut got_data = false;
        for inbound in batch {
            match inbound {
                Inbound::Bracket(ip) => {
                    let slot = self.emitter.reserve();
                    self.fill(slot, vec![Emission::Broadcast(ip)]);
                }
                Inbound::Data(port, value) => {
                    // Last value wins until the next firing consumes it.
                    self.pending.insert(port, value);
                    got_data = true;
                }
            }
        }
        if got_data && self.ready() {
            self.fire(inflight);
        }
    }

    fn ready(&self) -> bool {
        self.signature
            .params
            .iter()
            .filter(|p| p.is_required())
            .all(|p| self.pending.contains_key(&p.name))
    }

    fn take_args(&mut self) -> Args {
        let values = self
            .signature
            .params
            .iter()
            .map(|p| {
                self.pending
                    .remove(&p.name)
                    .or_else(|| p.default.clone())
                    .unwrap_or(Value::Null)
            })
            .collect();
        // Anything left (the trigger port of a parameterless function) is consumed too.
        self.pending.clear();
        Args::new(Arc::clone(&self.param_names), values)
    }

    fn fire(&mut self, inflight: &mut JoinSet<(u64, Outcome)>) {
        let args = self.take_args();
        let slot = self.emitter.reserve();
        let callable = self.callable.clone();
        tracing::debug!(slot, convention = %callable.convention(), "activation fired");
        match &callable {
            Callable::Sync(f) => {
                let outcome = catch_unwind(AssertUnwindSafe(|| f(args)))
                    .unwrap_or_else(|p| Err(panic_error(p)));
                self.settle(slot, outcome);
            }
            Callable::Promise(f) => match catch_unwind(AssertUnwindSafe(|| f(args))) {
                Ok(future) => {
                    inflight.spawn(async move {
                        let outcome = AssertUnwindSafe(future)
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|p| Err(panic_error(p)));
                        (slot, outcome)
                    });
                }
                Err(p) => self.settle(slot, Err(panic_error(p))),
            },
            Callable::Callback(f) => {
                let (completion, mut rx) = Completion::new(Arc::clone(&self.result_names));
                if let Err(p) = catch_unwind(AssertUnwindSafe(|| f(args, completion))) {
                    self.settle(slot, Err(panic_error(p)));
                    return;
                }
                match rx.try_recv() {
                    Ok(outcome) => self.settle(slot, outcome),
                    Err(oneshot::error::TryRecvError::Closed) => {
                        self.settle(slot, Err(dropped_completion()));
                    }
                    Err(oneshot::error::TryRecvError::Empty) => {
                        inflight.spawn(async move {
                            let outcome = rx.await.unwrap_or_else(|_| Err(dropped_completion()));
                            (slot, outcome)
                        });
                    }
                }
            }
        }
    }

    fn settle(&mut self, slot: u64, outcome: Outcome) {
        let emissions = self.distribute(outcome);
        self.fill(slot, emissions);
    }

    /// Turn an outcome into packets for the success or error ports.
    fn distribute(&self, outcome: Outcome) -> Vec<Emission> {
        let value = match outcome {
            Ok(value) => value,
            Err(e) => return vec![error_emission(&e)],
        };
        let Some(results) = &self.signature.results else {
            return vec![Emission::To(PortName::new(OUT_PORT), Ip::Data(value))];
        };
        match value {
            Value::Object(mut fields) => results
                .iter()
                .map(|name| {
                    let field = fields.remove(name.as_str()).unwrap_or(Value::Null);
                    Emission::To(name.clone(), Ip::Data(field))
                })
                .collect(),
            other => vec![error_emission(&InvocationError::new(format!(
                "expected an object with fields {}, got {other}",
                results
                    .iter()
                    .map(PortName::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )))],
        }
    }

    fn fill(&mut self, slot: u64, emissions: Vec<Emission>) {
        for emission in self.emitter.fill(slot, emissions) {
            match emission {
                Emission::To(port, ip) => {
                    tracing::trace!(port = %port, kind = %ip.kind(), "emit");
                    if let Err(e) = self.outlets.emit(port.as_str(), ip) {
                        tracing::warn!(error = %e, "emission dropped");
                    }
                }
                Emission::Broadcast(ip) => self.outlets.broadcast(&ip),
            }
        }
    }
}

fn error_emission(e: &InvocationError) -> Emission {
    tracing::debug!(error = %e, "activation failed");
    Emission::To(PortName::new(ERROR_PORT), Ip::Data(e.to_payload()))
}

fn dropped_completion() -> InvocationError {
    tracing::warn!("completion dropped without being called");
    InvocationError::new("completion dropped without being called")
}
