//! Newtype IDs for type-safe identifiers.
//!
//! Ids are validated on construction and on deserialization, so a value of
//! these types is never empty. The mock API sometimes emits numeric ids;
//! those are accepted and normalized to strings.

use crate::CommerceError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire representation accepted for ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

/// Macro to generate validated newtype ID structs.
macro_rules! define_id {
    ($name:ident, $what:literal) => {
        /// A non-empty identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(String);

        impl $name {
            /// Create an ID, rejecting empty or blank strings.
            pub fn parse(id: impl Into<String>) -> Result<Self, CommerceError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(CommerceError::InvalidId($what));
                }
                Ok(Self(id))
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = CommerceError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = CommerceError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = match IdRepr::deserialize(deserializer)? {
                    IdRepr::Text(s) => s,
                    IdRepr::Number(n) => n.to_string(),
                };
                Self::parse(raw).map_err(serde::de::Error::custom)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId, "product");
define_id!(UserId, "user");
