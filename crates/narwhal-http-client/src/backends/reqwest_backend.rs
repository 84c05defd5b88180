//! reqwest-based RequestBuilder implementation

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::HttpError;
use crate::metadata::RequestDescriptor;
use crate::request_builder_ext::RequestBuilderExt;
use crate::response::{RawResponse, Response};
use crate::transfer::TransferControl;

/// reqwest-based RequestBuilder wrapper
#[derive(Debug)]
pub struct ReqwestRequestBuilder {
    inner: reqwest::RequestBuilder,
}

impl ReqwestRequestBuilder {
    /// Create a new ReqwestRequestBuilder from a reqwest::RequestBuilder
    pub(crate) fn new(inner: reqwest::RequestBuilder) -> Self {
        Self { inner }
    }
}

impl RequestBuilderExt for ReqwestRequestBuilder {
    fn header(self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self {
            inner: self.inner.header(key.as_ref(), value.as_ref()),
        }
    }

    fn headers(self, headers: HeaderMap) -> Self {
        Self {
            inner: self.inner.headers(headers),
        }
    }

    fn json<T: Serialize>(self, body: &T) -> Self {
        Self {
            inner: self.inner.json(body),
        }
    }

    fn form<T: Serialize>(self, body: &T) -> Self {
        Self {
            inner: self.inner.form(body),
        }
    }

    async fn send(self) -> Response<RawResponse> {
        self.send_with(TransferControl::new()).await
    }

    async fn send_with(self, control: TransferControl) -> Response<RawResponse> {
        control.ready().await?;

        let (client, request) = self.inner.build_split();
        let request = request.map_err(HttpError::from)?;
        let descriptor = RequestDescriptor::from(&request);

        tracing::debug!("{} {}", descriptor.method, descriptor.url);

        let response = tokio::select! {
            response = client.execute(request) => response.map_err(HttpError::from)?,
            _ = control.cancelled() => return Err(HttpError::Cancelled),
        };

        Ok(RawResponse::new(response, descriptor))
    }

    async fn send_json<R: DeserializeOwned>(self) -> Response<R> {
        let response = self.send().await?;
        let status = response.status();

        if !response.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(HttpError::Status { status, message });
        }

        response.json().await
    }
}
