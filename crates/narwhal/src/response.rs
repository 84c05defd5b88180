//! Typed response envelope

use narwhal_http_client::ResponseMetadata;

use crate::decode::JsonObject;
use crate::error::RequestError;

/// Outcome of one service request
///
/// At most one of `value` and `error` is populated. `error_body` is only set
/// next to an `error`, when an error key path is configured and the payload at
/// that path decodes into `E`.
#[derive(Debug)]
pub struct Response<T, E = JsonObject> {
    /// Decoded success payload
    pub value: Option<T>,
    /// What went wrong, if anything
    pub error: Option<RequestError>,
    /// Decoded error payload
    pub error_body: Option<E>,
    /// Status and headers of the HTTP response, when one was received
    pub metadata: Option<ResponseMetadata>,
}

impl<T, E> Default for Response<T, E> {
    fn default() -> Self {
        Self {
            value: None,
            error: None,
            error_body: None,
            metadata: None,
        }
    }
}

impl<T, E> Response<T, E> {
    /// Envelope carrying only an error
    pub fn from_error(error: RequestError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    /// `true` when no error was recorded
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// HTTP status code, when a response was received
    pub fn status(&self) -> Option<u16> {
        self.metadata.as_ref().map(|metadata| metadata.status.as_u16())
    }

    /// Collapse into a `Result`, dropping metadata and the error body
    ///
    /// A request without error whose payload did not decode yields `Ok(None)`.
    pub fn into_result(self) -> Result<Option<T>, RequestError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.value),
        }
    }
}
