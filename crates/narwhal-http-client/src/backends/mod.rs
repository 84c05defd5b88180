//! HTTP request builder backends

pub mod reqwest_backend;

pub use reqwest_backend::ReqwestRequestBuilder;
