//! Typed name wrappers for ports, bracket groups, and components.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Typed names keep port names, group labels and component names from
/// being mixed up. They are plain strings underneath with no format
/// requirement.
macro_rules! typed_name {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new name from anything that converts to String.
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

typed_name!(PortName, "Name of a port on a component.");
typed_name!(
    GroupLabel,
    "Opaque token correlating an open bracket with its matching close."
);
typed_name!(
    ComponentName,
    "Qualified component name as understood by a loader, e.g. `math/add`."
);
