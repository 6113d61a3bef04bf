//! Information packets: the unit that travels through sockets.

use crate::id::GroupLabel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The three kinds of information packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpKind {
    /// Carries a payload.
    Data,
    /// Opens a group of related packets.
    OpenBracket,
    /// Closes the group opened by the matching [`IpKind::OpenBracket`].
    CloseBracket,
}

impl IpKind {
    /// Whether this kind is a structural marker rather than data.
    pub fn is_bracket(self) -> bool {
        !matches!(self, IpKind::Data)
    }
}

impl fmt::Display for IpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IpKind::Data => "data",
            IpKind::OpenBracket => "open_bracket",
            IpKind::CloseBracket => "close_bracket",
        };
        f.write_str(s)
    }
}

/// An information packet.
///
/// Brackets carry a group label and never a payload; data always carries
/// a payload. `Data(Value::Null)` is a real value, distinct from absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum Ip {
    /// A data packet.
    Data(Value),
    /// Start of a bracketed group.
    OpenBracket(GroupLabel),
    /// End of a bracketed group.
    CloseBracket(GroupLabel),
}

impl Ip {
    /// Create a data packet.
    pub fn data(payload: impl Into<Value>) -> Self {
        Ip::Data(payload.into())
    }

    /// Create an open bracket.
    pub fn open(group: impl Into<GroupLabel>) -> Self {
        Ip::OpenBracket(group.into())
    }

    /// Create a close bracket.
    pub fn close(group: impl Into<GroupLabel>) -> Self {
        Ip::CloseBracket(group.into())
    }

    /// The kind of this packet.
    pub fn kind(&self) -> IpKind {
        match self {
            Ip::Data(_) => IpKind::Data,
            Ip::OpenBracket(_) => IpKind::OpenBracket,
            Ip::CloseBracket(_) => IpKind::CloseBracket,
        }
    }

    /// Whether this packet is a structural marker.
    pub fn is_bracket(&self) -> bool {
        self.kind().is_bracket()
    }

    /// The payload, if this is a data packet.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Ip::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Consume the packet and return its payload, if any.
    pub fn into_payload(self) -> Option<Value> {
        match self {
            Ip::Data(v) => Some(v),
            _ => None,
        }
    }

    /// The group label, if this is a bracket.
    pub fn group(&self) -> Option<&GroupLabel> {
        match self {
            Ip::OpenBracket(g) | Ip::CloseBracket(g) => Some(g),
            Ip::Data(_) => None,
        }
    }
}

/// Renders `kind content`, with string payloads unquoted:
/// `open_bracket a`, `data Hello Foo`, `data 42`.
impl fmt::Display for Ip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ip::Data(Value::String(s)) => write!(f, "{} {s}", self.kind()),
            Ip::Data(v) => write!(f, "{} {v}", self.kind()),
            Ip::OpenBracket(g) | Ip::CloseBracket(g) => write!(f, "{} {g}", self.kind()),
        }
    }
}
