//! HTTP response types

use serde::de::DeserializeOwned;

use crate::error::HttpError;
use crate::metadata::{RequestDescriptor, ResponseMetadata};
use crate::transfer::{Progress, TransferControl};

/// Transport result, failing with [`HttpError`] unless told otherwise
pub type Response<R, E = HttpError> = Result<R, E>;

/// Response whose body has not been read yet
#[derive(Debug)]
pub struct RawResponse {
    status: u16,
    request: RequestDescriptor,
    inner: reqwest::Response,
}

impl RawResponse {
    /// Create a new RawResponse from a reqwest::Response and what was sent
    pub(crate) fn new(response: reqwest::Response, request: RequestDescriptor) -> Self {
        Self {
            status: response.status().as_u16(),
            request,
            inner: response,
        }
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// The request that produced this response
    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    /// Snapshot of status, headers and final URL
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata::from(&self.inner)
    }

    /// Get the response body as text
    pub async fn text(self) -> Response<String> {
        self.inner.text().await.map_err(HttpError::from)
    }

    /// Get the response body as JSON
    pub async fn json<T: DeserializeOwned>(self) -> Response<T> {
        self.inner.json().await.map_err(HttpError::from)
    }

    /// Read the body chunk by chunk under a [`TransferControl`]
    ///
    /// Progress is reported after every chunk. The read pauses between chunks
    /// while the control is suspended and fails with [`HttpError::Cancelled`]
    /// once it is cancelled.
    pub async fn read_body(self, control: &TransferControl) -> Response<Vec<u8>> {
        let total = self.inner.content_length();
        let mut inner = self.inner;
        let mut body = Vec::with_capacity(total.unwrap_or_default().min(1 << 20) as usize);

        control.report(Progress {
            completed: 0,
            total,
        });

        loop {
            control.ready().await?;

            let chunk = tokio::select! {
                chunk = inner.chunk() => chunk.map_err(HttpError::from)?,
                _ = control.cancelled() => return Err(HttpError::Cancelled),
            };

            match chunk {
                Some(chunk) => {
                    body.extend_from_slice(&chunk);
                    control.report(Progress {
                        completed: body.len() as u64,
                        total,
                    });
                }
                None => break,
            }
        }

        tracing::trace!("Read {} body bytes from {}", body.len(), self.request.url);

        Ok(body)
    }
}
