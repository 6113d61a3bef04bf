//! Out-port fan-out and fault listeners for component implementations.

use crate::component::{IpHandler, StructuralErrorHandler};
use crate::error::{PortError, StructuralError};
use crate::id::PortName;
use crate::ip::Ip;
use crate::port::PortSpec;
use crate::socket::Socket;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone)]
enum Sink {
    Socket(Socket),
    Handler(IpHandler),
}

struct Outlet {
    name: PortName,
    sinks: Vec<Sink>,
}

/// The receivers attached to each out-port of one component.
///
/// Emission copies the receiver list and delivers outside the lock, so a
/// handler may subscribe or post without deadlocking.
pub struct Outlets {
    ports: Mutex<Vec<Outlet>>,
}

impl Outlets {
    /// One empty outlet per declared out-port.
    pub fn new(out_ports: &[PortSpec]) -> Self {
        Self {
            ports: Mutex::new(
                out_ports
                    .iter()
                    .map(|p| Outlet {
                        name: p.name.clone(),
                        sinks: Vec::new(),
                    })
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Outlet>> {
        self.ports
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_outlet<T>(
        &self,
        port: &str,
        f: impl FnOnce(&mut Outlet) -> T,
    ) -> Result<T, PortError> {
        let mut ports = self.lock();
        let outlet = ports
            .iter_mut()
            .find(|o| o.name == port)
            .ok_or_else(|| PortError::UnknownOutPort(PortName::new(port)))?;
        Ok(f(outlet))
    }

    /// Subscribe a handler to an out-port.
    pub fn subscribe(&self, port: &str, handler: IpHandler) -> Result<(), PortError> {
        self.with_outlet(port, |o| o.sinks.push(Sink::Handler(handler)))
    }

    /// Attach a socket to an out-port.
    pub fn attach(&self, port: &str, socket: Socket) -> Result<(), PortError> {
        self.with_outlet(port, |o| o.sinks.push(Sink::Socket(socket)))
    }

    /// Detach a socket. Returns whether it was attached to `port`.
    pub fn detach(&self, port: &str, socket: &Socket) -> bool {
        self.with_outlet(port, |o| {
            let before = o.sinks.len();
            o.sinks
                .retain(|s| !matches!(s, Sink::Socket(attached) if attached.same_as(socket)));
            before != o.sinks.len()
        })
        .unwrap_or(false)
    }

    /// Send a packet to every receiver of one out-port.
    pub fn emit(&self, port: &str, ip: Ip) -> Result<(), PortError> {
        let sinks = self.with_outlet(port, |o| o.sinks.clone())?;
        deliver(&sinks, ip);
        Ok(())
    }

    /// Send a packet to every receiver of every out-port, in declaration order.
    pub fn broadcast(&self, ip: &Ip) {
        let all: Vec<Vec<Sink>> = self.lock().iter().map(|o| o.sinks.clone()).collect();
        for sinks in &all {
            deliver(sinks, ip.clone());
        }
    }

    /// Whether anything is attached to `port`.
    pub fn is_connected(&self, port: &str) -> bool {
        self.with_outlet(port, |o| !o.sinks.is_empty())
            .unwrap_or(false)
    }
}

fn deliver(sinks: &[Sink], ip: Ip) {
    for sink in sinks {
        match sink {
            Sink::Socket(socket) => socket.post(ip.clone()),
            Sink::Handler(handler) => handler(&ip),
        }
    }
}

/// Subscribers to structural errors.
#[derive(Default)]
pub struct FaultListeners {
    handlers: Mutex<Vec<StructuralErrorHandler>>,
}

impl FaultListeners {
    /// Create an empty listener list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, handler: StructuralErrorHandler) {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(handler);
    }

    /// Log the error and hand it to every subscriber.
    pub fn report(&self, error: &StructuralError) {
        tracing::warn!(error = %error, "structural error");
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for handler in &handlers {
            handler(error);
        }
    }
}
