//! Narwhal error types

use narwhal_http_client::HttpError;
use thiserror::Error;

/// Errors reported inside a [`crate::Response`] envelope
#[derive(Debug, Error)]
pub enum RequestError {
    /// Body was present but was not valid JSON
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    /// A response middleware stopped the pipeline
    #[error("Request dropped by response middleware")]
    MiddlewareAborted,
    /// Error raised by the transport, including unacceptable status codes
    #[error(transparent)]
    Transport(#[from] HttpError),
}

impl RequestError {
    /// HTTP status code behind the error, if the transport reported one
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Transport(err) => err.status(),
            _ => None,
        }
    }
}

/// Errors raised while setting up a service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// Transport could not be built
    #[error(transparent)]
    Http(#[from] HttpError),
    /// Key path string is empty
    #[error("Invalid key path: `{0}`")]
    InvalidKeyPath(String),
}
