//! # rill-core: packets, ports and sockets for flow-based programming
//!
//! Components exchange [`Ip`]s (information packets) over named ports.
//! A [`Socket`] carries packets from one out-port to one in-port in FIFO
//! order. Besides data, packets can be brackets: structural markers that
//! delimit a group of related data and must survive every component on
//! the way.
//!
//! | Piece | Type | What it does |
//! |-------|------|-------------|
//! | Packet | [`Ip`], [`IpKind`] | Data or open/close bracket |
//! | Port | [`PortSpec`] | Named, directional endpoint with required/default metadata |
//! | Socket | [`Socket`] | Single-producer single-consumer FIFO connection |
//! | Brackets | [`BracketForwarder`] | Per-port nesting depth, replay decisions |
//! | Contract | [`Component`], [`ComponentFactory`], [`ComponentLoader`] | What loaders and graphs talk to |
//!
//! The registry that maps names to factories and the graph layer that
//! wires components together live outside this crate; they only use the
//! traits above.
//!
//! Payloads are `serde_json::Value`, so a `null` payload is a real value
//! distinct from the absence of one.

#![deny(missing_docs)]

pub mod bracket;
pub mod component;
pub mod error;
pub mod id;
pub mod ip;
pub mod outlet;
pub mod port;
pub mod socket;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use bracket::{BracketForwarder, Forward};
pub use component::{
    Component, ComponentDescriptor, ComponentFactory, ComponentLoader, IpHandler,
    StructuralErrorHandler,
};
pub use error::{ComponentError, LoadError, PortError, SocketError, StructuralError};
pub use id::{ComponentName, GroupLabel, PortName};
pub use ip::{Ip, IpKind};
pub use outlet::{FaultListeners, Outlets};
pub use port::{ERROR_PORT, IN_PORT, OUT_PORT, PortDirection, PortSpec};
pub use socket::{Socket, SocketEvent, SocketObserver};
