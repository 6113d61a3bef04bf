//! The component contract shared by every component implementation.
//!
//! Loaders and graph assembly only ever see these traits, whether an
//! instance came from the function adapter or was written by hand.

use crate::error::{ComponentError, LoadError, PortError, StructuralError};
use crate::id::{ComponentName, PortName};
use crate::ip::Ip;
use crate::port::{ERROR_PORT, PortDirection, PortSpec};
use crate::socket::Socket;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Callback receiving every packet emitted on an out-port.
pub type IpHandler = Arc<dyn Fn(&Ip) + Send + Sync>;

/// Callback receiving structural errors detected by a component.
pub type StructuralErrorHandler = Arc<dyn Fn(&StructuralError) + Send + Sync>;

/// Port declarations of a component, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Human-readable summary, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// In-ports in declaration order.
    pub in_ports: Vec<PortSpec>,
    /// Out-ports in declaration order.
    pub out_ports: Vec<PortSpec>,
}

impl ComponentDescriptor {
    /// Build a descriptor, rejecting duplicate or misdirected ports.
    pub fn new(in_ports: Vec<PortSpec>, out_ports: Vec<PortSpec>) -> Result<Self, ComponentError> {
        check_ports(&in_ports, PortDirection::In)?;
        check_ports(&out_ports, PortDirection::Out)?;
        Ok(Self {
            description: None,
            in_ports,
            out_ports,
        })
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Look up an in-port by name.
    pub fn in_port(&self, name: &str) -> Option<&PortSpec> {
        self.in_ports.iter().find(|p| p.name == name)
    }

    /// Look up an out-port by name.
    pub fn out_port(&self, name: &str) -> Option<&PortSpec> {
        self.out_ports.iter().find(|p| p.name == name)
    }

    /// In-port names in declaration order.
    pub fn in_port_names(&self) -> Vec<&str> {
        self.in_ports.iter().map(|p| p.name.as_str()).collect()
    }

    /// Out-port names in declaration order.
    pub fn out_port_names(&self) -> Vec<&str> {
        self.out_ports.iter().map(|p| p.name.as_str()).collect()
    }

    /// In-ports the component waits for before firing.
    pub fn required_in_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.in_ports.iter().filter(|p| p.required)
    }

    /// Out-ports carrying results, i.e. everything except `error`.
    pub fn success_ports(&self) -> impl Iterator<Item = &PortSpec> {
        self.out_ports.iter().filter(|p| !p.is_error())
    }

    /// The error out-port, if declared.
    pub fn error_port(&self) -> Option<&PortSpec> {
        self.out_port(ERROR_PORT)
    }
}

fn check_ports(ports: &[PortSpec], direction: PortDirection) -> Result<(), ComponentError> {
    let mut seen = HashSet::new();
    for port in ports {
        if port.direction != direction {
            return Err(ComponentError::InvalidDeclaration(format!(
                "port `{}` declared with the wrong direction",
                port.name
            )));
        }
        if !seen.insert(port.name.as_str()) {
            return Err(ComponentError::InvalidDeclaration(format!(
                "duplicate port `{}`",
                port.name
            )));
        }
    }
    Ok(())
}

/// A running component instance.
///
/// The uniform invocation contract: packets go in through [`post`](Component::post)
/// and come out through handlers registered with [`on_ip`](Component::on_ip)
/// or sockets attached to out-ports.
pub trait Component: Send + Sync {
    /// Declared ports.
    fn descriptor(&self) -> &ComponentDescriptor;

    /// Deliver one packet to an in-port.
    ///
    /// Returns [`PortError::Structural`] for a close bracket without a
    /// matching open; the packet is then discarded and also reported to
    /// [`on_structural_error`](Component::on_structural_error) subscribers.
    fn post(&self, port: &str, ip: Ip) -> Result<(), PortError>;

    /// Deliver several packets as one unit.
    ///
    /// Implementations that evaluate activation per packet should override
    /// this so a batch fires at most once after all of it is buffered.
    fn post_batch(&self, batch: Vec<(PortName, Ip)>) -> Result<(), PortError> {
        for (port, ip) in batch {
            self.post(port.as_str(), ip)?;
        }
        Ok(())
    }

    /// Subscribe to every packet emitted on an out-port.
    fn on_ip(&self, port: &str, handler: IpHandler) -> Result<(), PortError>;

    /// Subscribe to structural errors detected on any in-port.
    fn on_structural_error(&self, handler: StructuralErrorHandler);

    /// Add a socket to an out-port. Each emitted packet goes to every
    /// attached socket.
    fn attach_out(&self, port: &str, socket: Socket) -> Result<(), PortError>;

    /// Remove a socket from an out-port. Returns whether it was attached.
    fn detach_out(&self, port: &str, socket: &Socket) -> bool;
}

/// Produces component instances with a fixed port declaration.
pub trait ComponentFactory: Send + Sync {
    /// Ports every instance will declare.
    fn descriptor(&self) -> &ComponentDescriptor;

    /// Create a fresh instance.
    fn create(&self) -> Result<Arc<dyn Component>, ComponentError>;
}

/// Resolves qualified component names to fresh instances.
///
/// Implemented by the component registry; the core only consumes it.
#[async_trait]
pub trait ComponentLoader: Send + Sync {
    /// Instantiate the component registered under `name`.
    async fn load(&self, name: &ComponentName) -> Result<Arc<dyn Component>, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{OUT_PORT, PortSpec};
    use serde_json::json;

    fn descriptor() -> ComponentDescriptor {
        ComponentDescriptor::new(
            vec![
                PortSpec::required_in("name"),
                PortSpec::optional_in("greeting", json!("Hello")),
            ],
            vec![PortSpec::out(OUT_PORT), PortSpec::out(ERROR_PORT)],
        )
        .unwrap()
    }

    #[test]
    fn lookups_follow_declaration_order() {
        let d = descriptor();
        assert_eq!(d.in_port_names(), vec!["name", "greeting"]);
        assert_eq!(d.out_port_names(), vec!["out", "error"]);
        assert_eq!(d.required_in_ports().count(), 1);
        assert_eq!(
            d.success_ports().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            vec!["out"]
        );
        assert!(d.error_port().is_some());
        assert!(d.in_port("missing").is_none());
    }

    #[test]
    fn duplicate_ports_are_rejected() {
        let err = ComponentDescriptor::new(
            vec![PortSpec::required_in("x"), PortSpec::required_in("x")],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, ComponentError::InvalidDeclaration(_)));
    }

    #[test]
    fn direction_must_match_list() {
        let err = ComponentDescriptor::new(vec![PortSpec::out("x")], vec![]).unwrap_err();
        assert!(matches!(err, ComponentError::InvalidDeclaration(_)));
    }

    fn _assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn trait_objects_are_send_sync() {
        _assert_send_sync::<Arc<dyn Component>>();
        _assert_send_sync::<Arc<dyn ComponentFactory>>();
        _assert_send_sync::<Arc<dyn ComponentLoader>>();
    }
}
