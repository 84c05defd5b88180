//! Transport client and its builder

use std::time::Duration;

use reqwest::Method;

use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::Response;

/// Shared transport for every request of a service
///
/// Cloning is cheap: clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Client with reqwest defaults: no timeout, system proxy, strict TLS
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Configure timeout, proxy and TLS before building
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Reuse an already configured reqwest client
    pub fn from_reqwest(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// Start a request with any method
    ///
    /// An unparseable `url` is reported as [`HttpError::Build`] when the
    /// request is sent.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.inner.request(method, url))
    }

    /// Start a GET request
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.request(Method::GET, url)
    }

    /// Start a POST request
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.request(Method::POST, url)
    }

    /// Start a PUT request
    pub fn put(&self, url: &str) -> RequestBuilder {
        self.request(Method::PUT, url)
    }

    /// Start a PATCH request
    pub fn patch(&self, url: &str) -> RequestBuilder {
        self.request(Method::PATCH, url)
    }

    /// Start a DELETE request
    pub fn delete(&self, url: &str) -> RequestBuilder {
        self.request(Method::DELETE, url)
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    accept_invalid_certs: bool,
    timeout: Option<Duration>,
    proxy: Option<ProxyRoute>,
}

/// Proxy target, optionally restricted to hosts matching a pattern
#[derive(Debug)]
struct ProxyRoute {
    target: url::Url,
    hosts: Option<regex::Regex>,
}

impl ProxyRoute {
    fn into_proxy(self) -> Response<reqwest::Proxy> {
        let target = self.target.to_string();
        match self.hosts {
            Some(hosts) => Ok(reqwest::Proxy::custom(move |url| {
                url.host_str()
                    .filter(|host| hosts.is_match(host))
                    .map(|_| target.clone())
            })),
            None => reqwest::Proxy::all(&target).map_err(|e| HttpError::Proxy(e.to_string())),
        }
    }
}

impl HttpClientBuilder {
    /// Skip TLS certificate validation
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Total timeout for each request, enforced by the transport
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Route every request through `url`
    pub fn proxy(mut self, url: url::Url) -> Self {
        self.proxy = Some(ProxyRoute {
            target: url,
            hosts: None,
        });
        self
    }

    /// Route requests whose host matches `pattern` through `url`
    pub fn proxy_with_matcher(mut self, url: url::Url, pattern: &str) -> Response<Self> {
        let hosts = regex::Regex::new(pattern)
            .map_err(|e| HttpError::Proxy(format!("Invalid proxy pattern: {}", e)))?;
        self.proxy = Some(ProxyRoute {
            target: url,
            hosts: Some(hosts),
        });
        Ok(self)
    }

    /// Build the client
    pub fn build(self) -> Response<HttpClient> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(route) = self.proxy {
            builder = builder.proxy(route.into_proxy()?);
        }

        Ok(HttpClient {
            inner: builder.build()?,
        })
    }
}
