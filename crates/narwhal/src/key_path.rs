//! Dotted key paths into parsed JSON

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::Error;

/// Dotted path addressing a nested field, e.g. `data.user`
///
/// Segments are looked up as object keys. A segment made only of digits also
/// indexes into an array, so `items.0.id` reaches into the first element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Parse a key path, treating an empty string as "not configured"
    pub fn parse(path: &str) -> Option<Self> {
        if path.is_empty() {
            return None;
        }

        Some(Self {
            segments: path.split('.').map(str::to_owned).collect(),
        })
    }

    /// Path segments in lookup order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Locate the value at this path, if every segment resolves
    pub fn resolve<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index)),
                _ => None,
            })
    }

    /// Move the value at this path out of `root`, dropping the rest
    pub fn extract(&self, root: Value) -> Option<Value> {
        self.segments
            .iter()
            .try_fold(root, |current, segment| match current {
                Value::Object(mut map) => map.remove(segment),
                Value::Array(mut items) => segment
                    .parse::<usize>()
                    .ok()
                    .filter(|index| *index < items.len())
                    .map(|index| items.swap_remove(index)),
                _ => None,
            })
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| Error::InvalidKeyPath(s.to_owned()))
    }
}

impl Serialize for KeyPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
