//! HTTP error types

use thiserror::Error;

/// Errors raised by the transport before a response reaches the service layer
#[derive(Debug, Error)]
pub enum HttpError {
    /// Response status outside of the accepted `2xx` range
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, or reason phrase when the body is empty
        message: String,
    },
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Proxy error
    #[error("Proxy error: {0}")]
    Proxy(String),
    /// Client or request build error (bad URL, bad header, bad TLS config)
    #[error("Client build error: {0}")]
    Build(String),
    /// Transfer cancelled through its control handle
    #[error("Request cancelled")]
    Cancelled,
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl HttpError {
    /// Status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::Build(format!("Invalid URL: {}", err))
    }
}
