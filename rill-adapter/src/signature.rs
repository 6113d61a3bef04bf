//! Explicit signature descriptors.
//!
//! A signature is declared once, when the function is wrapped, and fixes
//! the component's ports for its whole lifetime.

use crate::error::{AdapterError, InvocationError};
use rill_core::{
    ComponentDescriptor, ERROR_PORT, IN_PORT, OUT_PORT, PortName, PortSpec,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// How the wrapped callable delivers its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Returns `Ok`/`Err` directly. Panics count as failures too.
    Sync,
    /// Returns a future resolving to `Ok`/`Err`.
    Promise,
    /// Receives a [`Completion`](crate::Completion) and calls it later.
    NodeCallback,
}

impl std::fmt::Display for Convention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Convention::Sync => "sync",
            Convention::Promise => "promise",
            Convention::NodeCallback => "node_callback",
        };
        f.write_str(s)
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name; becomes the in-port name.
    pub name: PortName,
    /// Default used when nothing arrived. A parameter without one is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl Param {
    /// A required parameter.
    pub fn required(name: impl Into<PortName>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// An optional parameter with a default.
    pub fn with_default(name: impl Into<PortName>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
        }
    }

    /// Whether the component waits for this parameter.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// Ordered parameters, optional named results and the calling convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    /// Parameters in declaration order.
    pub params: Vec<Param>,
    /// Named results; `None` means a single `out` port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<PortName>>,
    /// Calling convention.
    pub convention: Convention,
}

impl Signature {
    /// Validate and build a signature.
    pub fn new(
        params: Vec<Param>,
        results: Option<Vec<PortName>>,
        convention: Convention,
    ) -> Result<Self, AdapterError> {
        let mut seen = HashSet::new();
        for p in &params {
            if !seen.insert(p.name.as_str()) {
                return Err(AdapterError::DuplicateParam(p.name.to_string()));
            }
        }
        if let Some(results) = &results {
            if results.is_empty() {
                return Err(AdapterError::EmptyResults);
            }
            let mut seen = HashSet::new();
            for r in results {
                if r == ERROR_PORT {
                    return Err(AdapterError::ReservedResult(r.to_string()));
                }
                if !seen.insert(r.as_str()) {
                    return Err(AdapterError::DuplicateResult(r.to_string()));
                }
            }
        }
        Ok(Self {
            params,
            results,
            convention,
        })
    }

    /// In-port declarations: one per parameter, or the trigger port `in`
    /// when there are none.
    pub fn in_ports(&self) -> Vec<PortSpec> {
        if self.params.is_empty() {
            return vec![PortSpec::trigger_in(IN_PORT)];
        }
        self.params
            .iter()
            .map(|p| match &p.default {
                Some(default) => PortSpec::optional_in(p.name.clone(), default.clone()),
                None => PortSpec::required_in(p.name.clone()),
            })
            .collect()
    }

    /// Out-port declarations: results (or `out`) followed by `error`.
    pub fn out_ports(&self) -> Vec<PortSpec> {
        let mut ports: Vec<PortSpec> =
            self.success_ports().into_iter().map(PortSpec::out).collect();
        ports.push(PortSpec::out(ERROR_PORT));
        ports
    }

    /// The full port declaration.
    pub fn descriptor(&self) -> Result<ComponentDescriptor, AdapterError> {
        Ok(ComponentDescriptor::new(self.in_ports(), self.out_ports())?)
    }

    /// Names of the success out-ports.
    pub fn success_ports(&self) -> Vec<PortName> {
        match &self.results {
            Some(results) => results.clone(),
            None => vec![PortName::new(OUT_PORT)],
        }
    }
}

/// Positional arguments of one activation, addressable by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    names: Arc<[PortName]>,
    values: Vec<Value>,
}

impl Args {
    pub(crate) fn new(names: Arc<[PortName]>, values: Vec<Value>) -> Self {
        Self { names, values }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Argument at `index`, in parameter order.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Argument bound to the parameter `name`.
    pub fn value(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;
        self.values.get(index)
    }

    /// Deserialize the argument bound to `name`.
    pub fn parse<T: DeserializeOwned>(&self, name: &str) -> Result<T, InvocationError> {
        let value = self
            .value(name)
            .ok_or_else(|| InvocationError::new(format!("missing argument `{name}`")))?;
        Ok(T::deserialize(value)?)
    }

    /// Argument at `index` rendered as text: strings unquoted, other values as JSON.
    pub fn text(&self, index: usize) -> String {
        match self.get(index) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    /// The positional values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterate `(name, value)` pairs in parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(PortName::as_str).zip(self.values.iter())
    }
}
