//! Bridge configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A timeout in whole milliseconds; serializes as a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DurationMs(u64);

impl DurationMs {
    /// Create from milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// The value in milliseconds.
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl From<Duration> for DurationMs {
    fn from(d: Duration) -> Self {
        Self(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

impl From<DurationMs> for Duration {
    fn from(d: DurationMs) -> Self {
        Duration::from_millis(d.0)
    }
}

impl std::fmt::Display for DurationMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// How successful results are shaped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultShape {
    /// A single success port resolves to its bare value; several resolve to
    /// an object keyed by port name.
    #[default]
    Auto,
    /// Named arguments resolve to an object keyed by port name even for a
    /// single success port; positional arguments behave like `Auto`.
    MirrorInput,
}

/// Settings for a [`CallbackBridge`](crate::CallbackBridge).
///
/// ```
/// use rill_bridge::{BridgeConfig, DurationMs, ResultShape};
///
/// let config: BridgeConfig = serde_json::from_str(r#"{"timeout": 500}"#).unwrap();
/// assert_eq!(config.timeout, Some(DurationMs::from_millis(500)));
/// assert_eq!(config.result_shape, ResultShape::Auto);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Give up waiting after this long. `None` waits for as long as the
    /// component takes, which is forever if a required input never arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<DurationMs>,
    /// Result shaping.
    #[serde(default)]
    pub result_shape: ResultShape,
}

impl BridgeConfig {
    /// Set a timeout.
    pub fn with_timeout(mut self, timeout: impl Into<DurationMs>) -> Self {
        self.timeout = Some(timeout.into());
        self
    }

    /// Set the result shape.
    pub fn with_result_shape(mut self, shape: ResultShape) -> Self {
        self.result_shape = shape;
        self
    }
}
