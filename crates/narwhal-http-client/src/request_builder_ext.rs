//! HTTP RequestBuilder extension trait

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::response::{RawResponse, Response};
use crate::transfer::TransferControl;

/// Trait for building and sending HTTP requests
///
/// This trait abstracts over the HTTP client backend and provides a unified
/// interface for building and sending HTTP requests.
pub trait RequestBuilderExt: Sized + Send {
    /// Add a header to the request
    fn header(self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self;

    /// Add every header of `headers`, replacing earlier values of the same name
    fn headers(self, headers: HeaderMap) -> Self;

    /// Set the request body as JSON
    fn json<T: Serialize>(self, body: &T) -> Self;

    /// Set the request body as form data
    fn form<T: Serialize>(self, body: &T) -> Self;

    /// Send the request and return a raw response
    fn send(self) -> impl std::future::Future<Output = Response<RawResponse>> + Send;

    /// Send the request under a [`TransferControl`]
    ///
    /// The request waits while the control is suspended and is abandoned with
    /// [`crate::HttpError::Cancelled`] once it is cancelled.
    fn send_with(
        self,
        control: TransferControl,
    ) -> impl std::future::Future<Output = Response<RawResponse>> + Send;

    /// Send the request and deserialize the response as JSON
    fn send_json<R: DeserializeOwned>(
        self,
    ) -> impl std::future::Future<Output = Response<R>> + Send;
}
