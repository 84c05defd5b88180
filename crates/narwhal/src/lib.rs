//! Typed HTTP services
//!
//! Narwhal sits on top of [`narwhal_http_client`] and turns JSON responses
//! into typed values. A request goes through these stages:
//!
//! 1. the URL is built from the service base URL, the endpoint and query
//!    parameters, and headers are merged from endpoint defaults, the
//!    [`AuthManager`] and the call itself;
//! 2. a 401 answer is handed to the auth manager, which may ask for a resend;
//! 3. the [`MiddlewareChain`] inspects the raw response and may abort;
//! 4. the [`ResponseTransformer`] parses the body, routes errors to the error
//!    key path and decodes the value at the value key path.
//!
//! # Example
//!
//! ```no_run
//! use narwhal::{HttpService, Response};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct ApiError {
//!     code: u32,
//!     message: String,
//! }
//!
//! async fn example() {
//!     let service = HttpService::builder()
//!         .base_url("https://api.example.com")
//!         .value_key_path("data")
//!         .error_key_path("error")
//!         .build();
//!
//!     let response: Response<User, ApiError> = service.get("/users/7").send().await;
//!     match (response.value, response.error_body) {
//!         (Some(user), _) => println!("{} is #{}", user.name, user.id),
//!         (None, Some(err)) => println!("error {}: {}", err.code, err.message),
//!         (None, None) => println!("failed: {:?}", response.error),
//!     }
//! }
//! ```

mod auth;
mod config;
mod decode;
mod error;
mod handle;
mod key_path;
mod middleware;
mod params;
mod response;
mod service;
mod transform;

pub use auth::{merge_headers, AuthManager, Headers, RetryDecision};
pub use crate::config::{ServiceConfig, ENV_PREFIX};
pub use decode::{Decode, DecodeError, Empty, JsonObject};
pub use error::{Error, RequestError};
pub use handle::RequestHandle;
pub use key_path::KeyPath;
pub use middleware::{
    Middleware, MiddlewareChain, MiddlewareResponse, MiddlewareResult, TraceMiddleware,
};
pub use narwhal_http_client::{
    HttpClient, HttpClientBuilder, HttpError, Method, Progress, RequestDescriptor,
    ResponseMetadata, TransferState,
};
pub use params::{build_url, query_pairs, resolve_url, Parameters};
pub use response::Response;
pub use service::{EndpointHeaders, HttpService, HttpServiceBuilder, ServiceRequest};
pub use transform::ResponseTransformer;
