//! HTTP request builder

/// HTTP request builder for complex requests
pub use crate::backends::ReqwestRequestBuilder as RequestBuilder;
pub use crate::request_builder_ext::RequestBuilderExt;
