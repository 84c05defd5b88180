//! HTTP transport abstraction for Narwhal
//!
//! This crate wraps the underlying HTTP library (reqwest) so the service layer
//! never talks to it directly. Besides plain request/response plumbing it
//! exposes what a response pipeline needs to know about an exchange: the
//! [`RequestDescriptor`] that was sent, the [`ResponseMetadata`] that came
//! back, and a [`TransferControl`] for progress, suspend/resume and cancel.
//!
//! # Example
//!
//! ```no_run
//! use narwhal_http_client::{HttpClient, RequestBuilderExt, Response, TransferControl};
//!
//! async fn example() -> Response<Vec<u8>> {
//!     let client = HttpClient::new();
//!     let control = TransferControl::new();
//!     control.on_progress(|progress| println!("{} bytes", progress.completed));
//!
//!     let response = client
//!         .get("https://api.example.com/export")
//!         .header("Accept", "application/json")
//!         .send_with(control.clone())
//!         .await?;
//!     response.read_body(&control).await
//! }
//! ```

mod backends;
mod client;
mod error;
mod metadata;
mod request;
mod request_builder_ext;
mod response;
mod transfer;

pub use backends::ReqwestRequestBuilder;
pub use client::{HttpClient, HttpClientBuilder};
pub use error::HttpError;
pub use metadata::{RequestDescriptor, ResponseMetadata};
pub use request::{RequestBuilder, RequestBuilderExt};
pub use reqwest::header::{self, HeaderMap};
pub use reqwest::{Method, StatusCode};
pub use response::{RawResponse, Response};
pub use transfer::{Progress, TransferControl, TransferState};
