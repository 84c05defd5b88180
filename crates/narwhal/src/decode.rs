//! Decoding contract between parsed JSON and typed models

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Generic JSON object, the default error body type
pub type JsonObject = serde_json::Map<String, Value>;

/// Failure to turn a JSON value into a model
#[derive(Debug, Error)]
#[error("Decode error: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

/// A model that can be built from a parsed JSON value
///
/// Every `serde` [`DeserializeOwned`] type implements this.
pub trait Decode: Sized {
    /// Build `Self` from `value`
    fn decode(value: &Value) -> Result<Self, DecodeError>;
}

impl<T> Decode for T
where
    T: DeserializeOwned,
{
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        T::deserialize(value).map_err(DecodeError::from)
    }
}

/// Decode every element of `values`, skipping the ones that do not fit `T`
pub(crate) fn decode_each<T: Decode>(values: &[Value]) -> Vec<T> {
    values
        .iter()
        .enumerate()
        .filter_map(|(index, value)| match T::decode(value) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::debug!("Skipping array element {}: {}", index, err);
                None
            }
        })
        .collect()
}

/// Model for endpoints whose body is ignored; it never decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Empty;

impl<'de> Deserialize<'de> for Empty {
    fn deserialize<D: Deserializer<'de>>(_deserializer: D) -> Result<Self, D::Error> {
        Err(serde::de::Error::custom("Empty never decodes"))
    }
}
