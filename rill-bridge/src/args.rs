//! Arguments of a bridged call and their binding to in-ports.

use crate::error::BridgeError;
use rill_core::{ComponentDescriptor, Ip, PortName};
use serde_json::{Map, Value};

/// Arguments of a bridged call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// One value for the component's only in-port, or its only required one.
    Positional(Value),
    /// Values keyed by in-port name.
    Named(Map<String, Value>),
}

impl CallArgs {
    /// Whether arguments were given by name.
    pub fn is_named(&self) -> bool {
        matches!(self, CallArgs::Named(_))
    }

    /// Named arguments from `(port, value)` pairs.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        CallArgs::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// One data packet per addressed in-port, in declaration order.
    pub(crate) fn bind(
        self,
        descriptor: &ComponentDescriptor,
    ) -> Result<Vec<(PortName, Ip)>, BridgeError> {
        match self {
            CallArgs::Positional(value) => {
                let port = positional_port(descriptor)?;
                Ok(vec![(port, Ip::Data(value))])
            }
            CallArgs::Named(mut values) => {
                if values.is_empty() {
                    return Err(BridgeError::ArgumentMismatch(
                        "no named arguments given".into(),
                    ));
                }
                if let Some(unknown) = values.keys().find(|k| descriptor.in_port(k).is_none()) {
                    return Err(BridgeError::ArgumentMismatch(format!(
                        "no in-port named `{unknown}`"
                    )));
                }
                Ok(descriptor
                    .in_ports
                    .iter()
                    .filter_map(|p| {
                        values
                            .remove(p.name.as_str())
                            .map(|v| (p.name.clone(), Ip::Data(v)))
                    })
                    .collect())
            }
        }
    }
}

fn positional_port(descriptor: &ComponentDescriptor) -> Result<PortName, BridgeError> {
    if let [only] = descriptor.in_ports.as_slice() {
        return Ok(only.name.clone());
    }
    let required: Vec<_> = descriptor.required_in_ports().collect();
    match required.as_slice() {
        [only] => Ok(only.name.clone()),
        _ => Err(BridgeError::ArgumentMismatch(format!(
            "a single value cannot address in-ports {}",
            descriptor.in_port_names().join(", ")
        ))),
    }
}

impl From<Value> for CallArgs {
    /// Objects are named arguments; anything else is positional.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => CallArgs::Named(map),
            other => CallArgs::Positional(other),
        }
    }
}

impl From<Map<String, Value>> for CallArgs {
    fn from(map: Map<String, Value>) -> Self {
        CallArgs::Named(map)
    }
}

impl From<&str> for CallArgs {
    fn from(s: &str) -> Self {
        CallArgs::Positional(Value::from(s))
    }
}

impl From<String> for CallArgs {
    fn from(s: String) -> Self {
        CallArgs::Positional(Value::from(s))
    }
}
