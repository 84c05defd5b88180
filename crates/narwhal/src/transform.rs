//! Response transformation: raw bytes in, typed envelope out

use narwhal_http_client::{HttpError, ResponseMetadata};
use serde_json::Value;

use crate::decode::{decode_each, Decode};
use crate::error::RequestError;
use crate::key_path::KeyPath;
use crate::response::Response;

/// Turns a raw exchange into a [`Response`]
///
/// The body is parsed as JSON. When the transport reported an error, the
/// payload at the error key path is decoded into the error body and no value
/// is produced. Otherwise the payload at the value key path (or the whole
/// document) is decoded into the value.
#[derive(Debug, Clone, Default)]
pub struct ResponseTransformer {
    value_key_path: Option<KeyPath>,
    error_key_path: Option<KeyPath>,
}

impl ResponseTransformer {
    /// Create a transformer with optional key paths
    pub fn new(value_key_path: Option<KeyPath>, error_key_path: Option<KeyPath>) -> Self {
        Self {
            value_key_path,
            error_key_path,
        }
    }

    /// Key path of the success payload
    pub fn value_key_path(&self) -> Option<&KeyPath> {
        self.value_key_path.as_ref()
    }

    /// Key path of the error payload
    pub fn error_key_path(&self) -> Option<&KeyPath> {
        self.error_key_path.as_ref()
    }

    /// Decode a single model
    pub fn transform<T, E>(
        &self,
        body: Option<&[u8]>,
        error: Option<HttpError>,
        metadata: Option<ResponseMetadata>,
    ) -> Response<T, E>
    where
        T: Decode,
        E: Decode,
    {
        let mut response = Response {
            metadata,
            ..Default::default()
        };

        if let Some(payload) = self.base_transform(&mut response, body, error) {
            response.value = match T::decode(&payload) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!("Response value left empty: {}", err);
                    None
                }
            };
        }

        response
    }

    /// Decode an array of models
    ///
    /// The payload must be a JSON array. Elements that do not decode are
    /// skipped.
    pub fn transform_array<T, E>(
        &self,
        body: Option<&[u8]>,
        error: Option<HttpError>,
        metadata: Option<ResponseMetadata>,
    ) -> Response<Vec<T>, E>
    where
        T: Decode,
        E: Decode,
    {
        let mut response = Response {
            metadata,
            ..Default::default()
        };

        match self.base_transform(&mut response, body, error) {
            Some(Value::Array(items)) => response.value = Some(decode_each(&items)),
            Some(_) => tracing::debug!("Response value left empty: payload is not an array"),
            None => {}
        }

        response
    }

    /// Parse the body and route transport errors
    ///
    /// Returns the payload to decode into the value, or `None` when there is
    /// nothing to decode. Errors and the error body are recorded on `response`.
    fn base_transform<V, E>(
        &self,
        response: &mut Response<V, E>,
        body: Option<&[u8]>,
        error: Option<HttpError>,
    ) -> Option<Value>
    where
        E: Decode,
    {
        let json = match body {
            Some(bytes) if !bytes.is_empty() => match serde_json::from_slice::<Value>(bytes) {
                Ok(json) => Some(json),
                Err(err) => {
                    if let Some(transport) = error {
                        tracing::debug!(
                            "Transport error superseded by parse failure: {}",
                            transport
                        );
                    }
                    response.error = Some(RequestError::SerializationFailed(err.to_string()));
                    return None;
                }
            },
            _ => None,
        };

        if let Some(error) = error {
            response.error_body = match (self.error_key_path.as_ref(), json) {
                (Some(path), Some(json)) => path.extract(json).and_then(|payload| {
                    E::decode(&payload)
                        .map_err(|err| tracing::debug!("Error body left empty: {}", err))
                        .ok()
                }),
                _ => None,
            };
            response.error = Some(RequestError::Transport(error));
            return None;
        }

        let json = json?;
        match self.value_key_path.as_ref() {
            Some(path) => path.extract(json),
            None => Some(json),
        }
    }
}
