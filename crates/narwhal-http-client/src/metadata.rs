//! Request and response metadata snapshots

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

/// What was actually sent: method, final URL and headers
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// HTTP method
    pub method: Method,
    /// Final URL, including the encoded query
    pub url: url::Url,
    /// Headers as sent
    pub headers: HeaderMap,
}

impl From<&reqwest::Request> for RequestDescriptor {
    fn from(request: &reqwest::Request) -> Self {
        Self {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
        }
    }
}

/// Status line and headers of a received response
#[derive(Debug, Clone)]
pub struct ResponseMetadata {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// URL the response came from, after redirects
    pub url: url::Url,
}

impl ResponseMetadata {
    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Value of a header, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

impl From<&reqwest::Response> for ResponseMetadata {
    fn from(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().clone(),
        }
    }
}
