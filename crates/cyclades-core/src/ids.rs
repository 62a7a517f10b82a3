//! Strongly-typed ids for Cyclades resources.
//!
//! Servers and flavors are addressed by numeric ids while images use UUIDs. Each wrapper
//! keeps the id in the form it was given (number or string) so it serializes back the
//! same way, and only interpolates it into paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(u64),
    Text(String),
}

/// Macro to generate id wrapper types.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $doc:expr) => {
        $(#[$meta])*
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Repr);

        impl $name {
            /// Creates an id from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(Repr::Text(id.into()))
            }

            /// Returns the numeric value when the id was numeric.
            #[must_use]
            pub const fn as_number(&self) -> Option<u64> {
                match self.0 {
                    Repr::Number(n) => Some(n),
                    Repr::Text(_) => None,
                }
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self::new(id)
            }
        }

        impl From<&String> for $name {
            fn from(id: &String) -> Self {
                Self::new(id.as_str())
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(Repr::Number(id))
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(Repr::Number(u64::from(id)))
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self::new(id.to_string())
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match &self.0 {
                    Repr::Number(n) => write!(f, "{n}"),
                    Repr::Text(s) => f.write_str(s),
                }
            }
        }
    };
}

id_type!(ServerId, "Virtual server id");
id_type!(ImageId, "Boot image id");
id_type!(FlavorId, "Hardware flavor id");
