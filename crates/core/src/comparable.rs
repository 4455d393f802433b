//! Content based identity for retrieved entities.
//!
//! The portals hand out no stable ids for transactions, so an entity is
//! identified by a digest of its canonical JSON form. Two payloads with the
//! same fields compare equal no matter how the server ordered the keys.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of an entity's comparable data.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Computes the identity of a JSON value.
    pub fn of(value: &Value) -> Self {
        let canonical = canonicalize(value).to_string();
        let digest = Sha256::digest(canonical.as_bytes());
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rebuilds every object with its keys in sorted order.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Value::Object(
                keys.into_iter()
                    .map(|key| (key.clone(), canonicalize(&map[key])))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Something that can be compared based on its data.
pub trait Comparable {
    /// The data the identity is derived from.
    fn comparable_data(&self) -> Value;

    /// Unique identity of this entity.
    fn identity(&self) -> Identity {
        Identity::of(&self.comparable_data())
    }
}

/// Keeps the first occurrence of every identity, preserving order.
pub fn dedup_by_identity<T: Comparable>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity()))
        .collect()
}

/// Implements `PartialEq`, `Eq` and `Hash` for a [`Comparable`] type in
/// terms of its identity.
#[macro_export]
macro_rules! impl_identity_eq {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ::std::cmp::PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $crate::comparable::Comparable::identity(self)
                        == $crate::comparable::Comparable::identity(other)
                }
            }

            impl ::std::cmp::Eq for $ty {}

            impl ::std::hash::Hash for $ty {
                fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
                    ::std::hash::Hash::hash(&$crate::comparable::Comparable::identity(self), state);
                }
            }
        )+
    };
}
