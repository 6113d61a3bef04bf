//! EchoComponent: re-emits every data packet unchanged on `out`.

use crate::bracket::{BracketForwarder, Forward};
use crate::component::{
    Component, ComponentDescriptor, ComponentFactory, IpHandler, StructuralErrorHandler,
};
use crate::error::{ComponentError, PortError};
use crate::id::PortName;
use crate::ip::Ip;
use crate::outlet::{FaultListeners, Outlets};
use crate::port::{ERROR_PORT, IN_PORT, OUT_PORT, PortSpec};
use crate::socket::Socket;
use std::sync::{Arc, Mutex, OnceLock};

/// A hand-written component with one in-port and the conventional
/// out-ports. It processes packets synchronously inside `post`.
pub struct EchoComponent {
    descriptor: ComponentDescriptor,
    brackets: Mutex<BracketForwarder>,
    outlets: Outlets,
    faults: FaultListeners,
}

fn echo_descriptor() -> &'static ComponentDescriptor {
    static DESCRIPTOR: OnceLock<ComponentDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| ComponentDescriptor {
        description: Some("Echoes data packets".into()),
        in_ports: vec![PortSpec::required_in(IN_PORT)],
        out_ports: vec![PortSpec::out(OUT_PORT), PortSpec::out(ERROR_PORT)],
    })
}

impl EchoComponent {
    /// Create an instance.
    pub fn new() -> Self {
        let descriptor = echo_descriptor().clone();
        let outlets = Outlets::new(&descriptor.out_ports);
        Self {
            descriptor,
            brackets: Mutex::new(BracketForwarder::new()),
            outlets,
            faults: FaultListeners::new(),
        }
    }

    /// A factory producing echo components.
    pub fn factory() -> Arc<dyn ComponentFactory> {
        Arc::new(EchoFactory)
    }
}

impl Default for EchoComponent {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for EchoComponent {
    fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    fn post(&self, port: &str, ip: Ip) -> Result<(), PortError> {
        if self.descriptor.in_port(port).is_none() {
            return Err(PortError::UnknownInPort(PortName::new(port)));
        }
        let forward = self
            .brackets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .observe(&PortName::new(port), ip);
        match forward {
            Ok(Forward::Bracket(ip)) => self.outlets.broadcast(&ip),
            Ok(Forward::Data(ip)) => self.outlets.emit(OUT_PORT, ip)?,
            Err(e) => {
                self.faults.report(&e);
                return Err(e.into());
            }
        }
        Ok(())
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

struct EchoFactory;

impl ComponentFactory for EchoFactory {
    fn descriptor(&self) -> &ComponentDescriptor {
        echo_descriptor()
    }

    fn create(&self) -> Result<Arc<dyn Component>, ComponentError> {
        Ok(Arc::new(EchoComponent::new()))
    }
}
