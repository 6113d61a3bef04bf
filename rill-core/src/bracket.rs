//! Bracket bookkeeping per in-port.
//!
//! The forwarder only tracks nesting depth and decides whether a bracket
//! may be replayed onto the out-ports. It knows nothing about payloads, so
//! any component implementation can reuse it.

use crate::error::StructuralError;
use crate::id::PortName;
use crate::ip::Ip;
use std::collections::HashMap;

/// What a component should do with a packet after the forwarder saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Forward {
    /// A bracket to replay, unchanged, on every out-port.
    Bracket(Ip),
    /// A data packet for the activation buffer.
    Data(Ip),
}

/// Open-bracket depth per in-port.
#[derive(Debug, Default, Clone)]
pub struct BracketForwarder {
    depth: HashMap<PortName, usize>,
}

impl BracketForwarder {
    /// Create a forwarder with every port idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one packet that arrived on `port`.
    ///
    /// Opens increase the depth, closes decrease it. A close at depth zero
    /// leaves the state untouched and must not be forwarded.
    pub fn observe(&mut self, port: &PortName, ip: Ip) -> Result<Forward, StructuralError> {
        match ip {
            Ip::Data(_) => Ok(Forward::Data(ip)),
            Ip::OpenBracket(_) => {
                *self.depth.entry(port.clone()).or_insert(0) += 1;
                Ok(Forward::Bracket(ip))
            }
            Ip::CloseBracket(ref group) => match self.depth.get_mut(port) {
                Some(depth) if *depth > 0 => {
                    *depth -= 1;
                    Ok(Forward::Bracket(ip))
                }
                _ => Err(StructuralError::UnmatchedClose {
                    port: port.clone(),
                    group: group.clone(),
                }),
            },
        }
    }

    /// Currently open brackets on `port`.
    pub fn depth(&self, port: &str) -> usize {
        self.depth.get(port).copied().unwrap_or(0)
    }

    /// Whether every port is back at depth zero.
    pub fn is_idle(&self) -> bool {
        self.depth.values().all(|d| *d == 0)
    }
}
