//! Port declarations.

use crate::id::PortName;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the synthetic in-port given to components without parameters.
pub const IN_PORT: &str = "in";
/// Name of the conventional success out-port.
pub const OUT_PORT: &str = "out";
/// Name of the conventional error out-port.
pub const ERROR_PORT: &str = "error";

/// Which way packets flow through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    /// Packets flow into the component.
    In,
    /// Packets flow out of the component.
    Out,
}

/// A named, directional endpoint declared by a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique per direction on a component.
    pub name: PortName,
    /// Direction of flow.
    pub direction: PortDirection,
    /// Whether the component waits for a value on this port before firing.
    pub required: bool,
    /// Value used when the port is optional and nothing arrived.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present_value"
    )]
    pub default: Option<Value>,
}

// A declared `null` default is still a default; plain `Option<Value>`
// would read it back as absent.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl PortSpec {
    /// A required in-port.
    pub fn required_in(name: impl Into<PortName>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::In,
            required: true,
            default: None,
        }
    }

    /// An optional in-port with a default value.
    pub fn optional_in(name: impl Into<PortName>, default: Value) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::In,
            required: false,
            default: Some(default),
        }
    }

    /// An in-port that neither requires data nor supplies a default.
    ///
    /// Used for the trigger port of parameterless components: any data
    /// packet on it fires the component.
    pub fn trigger_in(name: impl Into<PortName>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::In,
            required: false,
            default: None,
        }
    }

    /// An out-port.
    pub fn out(name: impl Into<PortName>) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Out,
            required: false,
            default: None,
        }
    }

    /// Whether the component waits for this port.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether a default value is declared.
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Whether this is the conventional error out-port.
    pub fn is_error(&self) -> bool {
        self.direction == PortDirection::Out && self.name == ERROR_PORT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_and_default_flags() {
        let name = PortSpec::required_in("name");
        assert!(name.is_required());
        assert!(!name.has_default());

        let greeting = PortSpec::optional_in("greeting", json!("Hello"));
        assert!(!greeting.is_required());
        assert!(greeting.has_default());

        let trigger = PortSpec::trigger_in(IN_PORT);
        assert!(!trigger.is_required());
        assert!(!trigger.has_default());
    }

    #[test]
    fn null_default_still_counts_as_default() {
        let p = PortSpec::optional_in("x", Value::Null);
        assert!(p.has_default());

        let json = serde_json::to_value(&p).unwrap();
        let back: PortSpec = serde_json::from_value(json).unwrap();
        assert!(back.has_default());
    }

    #[test]
    fn error_port_detection() {
        assert!(PortSpec::out(ERROR_PORT).is_error());
        assert!(!PortSpec::out(OUT_PORT).is_error());
        assert!(!PortSpec::required_in(ERROR_PORT).is_error());
    }
}
