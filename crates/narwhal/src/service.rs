//! HTTP service: request construction, auth retry and response delivery

use std::fmt;
use std::sync::Arc;

use narwhal_http_client::{
    HttpClient, HttpError, Method, RawResponse, RequestBuilderExt, ResponseMetadata,
    TransferControl,
};
use serde_json::Value;
use tracing::instrument;

use crate::auth::{merge_headers, AuthManager, Headers};
use crate::config::ServiceConfig;
use crate::decode::Decode;
use crate::error::{Error, RequestError};
use crate::handle::RequestHandle;
use crate::key_path::KeyPath;
use crate::middleware::{Middleware, MiddlewareChain, MiddlewareResponse, MiddlewareResult};
use crate::params::{build_url, encodes_in_query, Parameters};
use crate::response::Response;
use crate::transform::ResponseTransformer;

/// Per-endpoint additional headers
pub type EndpointHeaders = Arc<dyn Fn(&str) -> Headers + Send + Sync>;

/// A configured HTTP service
///
/// Holds the base URL, default key paths, response middlewares, header
/// sources and the optional auth manager. Cloning is cheap and clones share
/// the same configuration.
#[derive(Clone)]
pub struct HttpService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    client: HttpClient,
    base_url: Option<String>,
    value_key_path: Option<KeyPath>,
    error_key_path: Option<KeyPath>,
    middlewares: MiddlewareChain,
    default_headers: Headers,
    endpoint_headers: Option<EndpointHeaders>,
    auth_manager: Option<Arc<dyn AuthManager>>,
}

impl fmt::Debug for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpService")
            .field("base_url", &self.inner.base_url)
            .field("value_key_path", &self.inner.value_key_path)
            .field("error_key_path", &self.inner.error_key_path)
            .field("middlewares", &self.inner.middlewares)
            .field("auth_manager", &self.inner.auth_manager)
            .finish_non_exhaustive()
    }
}

impl HttpService {
    /// Create a new service builder
    pub fn builder() -> HttpServiceBuilder {
        HttpServiceBuilder::default()
    }

    /// Service with a base URL and otherwise default settings
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::builder().base_url(base_url).build()
    }

    /// Base URL prepended to relative endpoints
    pub fn base_url(&self) -> Option<&str> {
        self.inner.base_url.as_deref()
    }

    /// Default key path of success payloads
    pub fn value_key_path(&self) -> Option<&KeyPath> {
        self.inner.value_key_path.as_ref()
    }

    /// Default key path of error payloads
    pub fn error_key_path(&self) -> Option<&KeyPath> {
        self.inner.error_key_path.as_ref()
    }

    /// Start a request to `endpoint`, `GET` unless changed
    pub fn request(&self, endpoint: impl Into<String>) -> ServiceRequest {
        ServiceRequest {
            service: self.clone(),
            endpoint: endpoint.into(),
            method: Method::GET,
            params: None,
            headers: Headers::new(),
            value_key_path: None,
            error_key_path: None,
        }
    }

    /// GET request to `endpoint`
    pub fn get(&self, endpoint: impl Into<String>) -> ServiceRequest {
        self.request(endpoint)
    }

    /// POST request to `endpoint`
    pub fn post(&self, endpoint: impl Into<String>) -> ServiceRequest {
        self.request(endpoint).method(Method::POST)
    }

    /// PUT request to `endpoint`
    pub fn put(&self, endpoint: impl Into<String>) -> ServiceRequest {
        self.request(endpoint).method(Method::PUT)
    }

    /// PATCH request to `endpoint`
    pub fn patch(&self, endpoint: impl Into<String>) -> ServiceRequest {
        self.request(endpoint).method(Method::PATCH)
    }

    /// DELETE request to `endpoint`
    pub fn delete(&self, endpoint: impl Into<String>) -> ServiceRequest {
        self.request(endpoint).method(Method::DELETE)
    }

    /// Headers computed for `endpoint`, applied over the static defaults
    fn endpoint_headers(&self, endpoint: &str) -> Headers {
        self.inner
            .endpoint_headers
            .as_ref()
            .map(|headers| headers(endpoint))
            .unwrap_or_default()
    }
}

/// Builder for [`HttpService`]
#[derive(Default)]
pub struct HttpServiceBuilder {
    client: Option<HttpClient>,
    base_url: Option<String>,
    value_key_path: Option<KeyPath>,
    error_key_path: Option<KeyPath>,
    middlewares: MiddlewareChain,
    default_headers: Headers,
    endpoint_headers: Option<EndpointHeaders>,
    auth_manager: Option<Arc<dyn AuthManager>>,
}

impl fmt::Debug for HttpServiceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpServiceBuilder")
            .field("base_url", &self.base_url)
            .field("value_key_path", &self.value_key_path)
            .field("error_key_path", &self.error_key_path)
            .field("middlewares", &self.middlewares)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

impl HttpServiceBuilder {
    /// Builder pre-filled from a [`ServiceConfig`], including its transport settings
    pub fn from_config(config: &ServiceConfig) -> Result<Self, Error> {
        let mut builder = Self {
            client: Some(config.http_client()?),
            base_url: config.base_url.clone(),
            value_key_path: config.value_key_path.clone(),
            error_key_path: config.error_key_path.clone(),
            default_headers: config.default_headers.clone(),
            ..Default::default()
        };

        if builder.base_url.as_deref() == Some("") {
            tracing::warn!("Ignoring empty base URL in service configuration");
            builder.base_url = None;
        }

        Ok(builder)
    }

    /// Transport to send requests with
    pub fn client(mut self, client: HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    /// Prefix for relative endpoints
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Default key path of success payloads; empty clears it
    pub fn value_key_path(mut self, path: &str) -> Self {
        self.value_key_path = KeyPath::parse(path);
        self
    }

    /// Default key path of error payloads; empty clears it
    pub fn error_key_path(mut self, path: &str) -> Self {
        self.error_key_path = KeyPath::parse(path);
        self
    }

    /// Append a response middleware
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(middleware);
        self
    }

    /// Header sent with every request unless overridden
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.default_headers, name.into(), value.into());
        self
    }

    /// Additional headers computed from the endpoint string
    pub fn endpoint_headers<F>(mut self, headers: F) -> Self
    where
        F: Fn(&str) -> Headers + Send + Sync + 'static,
    {
        self.endpoint_headers = Some(Arc::new(headers));
        self
    }

    /// Auth manager providing headers and 401 retry decisions
    pub fn auth_manager(mut self, auth_manager: Arc<dyn AuthManager>) -> Self {
        self.auth_manager = Some(auth_manager);
        self
    }

    /// Build the service
    pub fn build(self) -> HttpService {
        HttpService {
            inner: Arc::new(ServiceInner {
                client: self.client.unwrap_or_default(),
                base_url: self.base_url,
                value_key_path: self.value_key_path,
                error_key_path: self.error_key_path,
                middlewares: self.middlewares,
                default_headers: self.default_headers,
                endpoint_headers: self.endpoint_headers,
                auth_manager: self.auth_manager,
            }),
        }
    }
}

/// Raw outcome of an exchange that passed the middlewares
struct Exchange {
    body: Option<Vec<u8>>,
    error: Option<HttpError>,
    metadata: Option<ResponseMetadata>,
}

/// One request against an [`HttpService`]
///
/// Key paths set here override the service defaults for this call only.
#[derive(Debug)]
pub struct ServiceRequest {
    service: HttpService,
    endpoint: String,
    method: Method,
    params: Option<Parameters>,
    headers: Headers,
    /// `Some(None)` turns the service default off for this call
    value_key_path: Option<Option<KeyPath>>,
    error_key_path: Option<Option<KeyPath>>,
}

impl ServiceRequest {
    /// HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Replace all parameters
    pub fn params(mut self, params: Parameters) -> Self {
        self.params = Some(params);
        self
    }

    /// Set one parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Parameters::new)
            .insert(key.into(), value.into());
        self
    }

    /// Header for this call; overrides endpoint and auth headers
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.headers, name.into(), value.into());
        self
    }

    /// Headers for this call
    pub fn headers(mut self, headers: Headers) -> Self {
        for (name, value) in headers {
            insert_header(&mut self.headers, name, value);
        }
        self
    }

    /// Key path of the success payload for this call
    ///
    /// An empty path decodes the whole document, ignoring the service default.
    pub fn value_key_path(mut self, path: &str) -> Self {
        self.value_key_path = Some(KeyPath::parse(path));
        self
    }

    /// Key path of the error payload for this call
    ///
    /// An empty path decodes the whole document, ignoring the service default.
    pub fn error_key_path(mut self, path: &str) -> Self {
        self.error_key_path = Some(KeyPath::parse(path));
        self
    }

    /// Send and decode a single model
    ///
    /// When a middleware aborts, the envelope carries
    /// [`RequestError::MiddlewareAborted`].
    pub async fn send<T, E>(self) -> Response<T, E>
    where
        T: Decode,
        E: Decode,
    {
        match self.deliver(TransferControl::new()).await {
            Some((transformer, exchange)) => {
                transformer.transform(exchange.body.as_deref(), exchange.error, exchange.metadata)
            }
            None => Response::from_error(RequestError::MiddlewareAborted),
        }
    }

    /// Send and decode an array of models
    pub async fn send_array<T, E>(self) -> Response<Vec<T>, E>
    where
        T: Decode,
        E: Decode,
    {
        match self.deliver(TransferControl::new()).await {
            Some((transformer, exchange)) => transformer.transform_array(
                exchange.body.as_deref(),
                exchange.error,
                exchange.metadata,
            ),
            None => Response::from_error(RequestError::MiddlewareAborted),
        }
    }

    /// Send in the background and hand the decoded model to `callback`
    ///
    /// The callback runs exactly once, unless a middleware aborts, in which
    /// case it never runs. Must be called within a tokio runtime.
    pub fn dispatch<T, E, F>(self, callback: F) -> RequestHandle
    where
        T: Decode + Send + 'static,
        E: Decode + Send + 'static,
        F: FnOnce(Response<T, E>) + Send + 'static,
    {
        let control = TransferControl::new();
        let task_control = control.clone();

        let task = tokio::spawn(async move {
            if let Some((transformer, exchange)) = self.deliver(task_control).await {
                callback(transformer.transform(
                    exchange.body.as_deref(),
                    exchange.error,
                    exchange.metadata,
                ));
            }
        });

        RequestHandle::new(control, task)
    }

    /// Send in the background and hand the decoded models to `callback`
    pub fn dispatch_array<T, E, F>(self, callback: F) -> RequestHandle
    where
        T: Decode + Send + 'static,
        E: Decode + Send + 'static,
        F: FnOnce(Response<Vec<T>, E>) + Send + 'static,
    {
        let control = TransferControl::new();
        let task_control = control.clone();

        let task = tokio::spawn(async move {
            if let Some((transformer, exchange)) = self.deliver(task_control).await {
                callback(transformer.transform_array(
                    exchange.body.as_deref(),
                    exchange.error,
                    exchange.metadata,
                ));
            }
        });

        RequestHandle::new(control, task)
    }

    fn transformer(&self) -> ResponseTransformer {
        let inner = &self.service.inner;
        ResponseTransformer::new(
            self.value_key_path
                .clone()
                .unwrap_or_else(|| inner.value_key_path.clone()),
            self.error_key_path
                .clone()
                .unwrap_or_else(|| inner.error_key_path.clone()),
        )
    }

    /// Run the exchange and the middlewares; `None` when a middleware aborted
    async fn deliver(
        self,
        control: TransferControl,
    ) -> Option<(ResponseTransformer, Exchange)> {
        let transformer = self.transformer();
        let exchange = self.exchange(&control).await;

        if exchange.is_none() {
            tracing::debug!(
                "Response for {} {} dropped by middleware",
                self.method,
                self.endpoint
            );
        }

        exchange.map(|exchange| (transformer, exchange))
    }

    #[instrument(skip_all, fields(method = %self.method, endpoint = %self.endpoint))]
    async fn exchange(&self, control: &TransferControl) -> Option<Exchange> {
        let (snapshot, error) = match self.transmit(control).await {
            Ok(raw) => {
                let request = raw.request().clone();
                let metadata = raw.metadata();
                let status = raw.status();

                match raw.read_body(control).await {
                    Ok(body) => {
                        let error = (!metadata.is_success()).then(|| HttpError::Status {
                            status,
                            message: status_message(&body, &metadata),
                        });
                        let snapshot = MiddlewareResponse {
                            body: Some(body),
                            request: Some(request),
                            response: Some(metadata),
                        };
                        (snapshot, error)
                    }
                    Err(err) => {
                        let snapshot = MiddlewareResponse {
                            body: None,
                            request: Some(request),
                            response: Some(metadata),
                        };
                        (snapshot, Some(err))
                    }
                }
            }
            Err(err) => (MiddlewareResponse::default(), Some(err)),
        };

        if self.service.inner.middlewares.evaluate(&snapshot) == MiddlewareResult::Abort {
            return None;
        }

        Some(Exchange {
            body: snapshot.body,
            error,
            metadata: snapshot.response,
        })
    }

    /// Send the request, resending on 401 for as long as the auth manager asks to
    async fn transmit(&self, control: &TransferControl) -> Result<RawResponse, HttpError> {
        let inner = &self.service.inner;
        let url = build_url(
            inner.base_url.as_deref(),
            &self.endpoint,
            &self.method,
            self.params.as_ref(),
        )?;
        let endpoint_headers = self.service.endpoint_headers(&self.endpoint);
        let body = self
            .params
            .as_ref()
            .filter(|params| !params.is_empty() && !encodes_in_query(&self.method));

        loop {
            let auth_headers = inner
                .auth_manager
                .as_ref()
                .map(|auth| auth.headers())
                .unwrap_or_default();
            let headers = merge_headers([
                &inner.default_headers,
                &endpoint_headers,
                &auth_headers,
                &self.headers,
            ])?;

            let mut request = inner
                .client
                .request(self.method.clone(), url.as_str())
                .headers(headers);
            if let Some(body) = body {
                request = request.json(body);
            }

            let raw = request.send_with(control.clone()).await?;

            let Some(auth) = inner.auth_manager.as_ref() else {
                return Ok(raw);
            };
            if raw.status() != 401 {
                return Ok(raw);
            }

            let decision = auth.should_retry(raw.request(), &raw.metadata()).await;
            if !decision.should_retry {
                return Ok(raw);
            }

            tracing::warn!(
                "Request to {} rejected with 401, resending in {:?}",
                url,
                decision.delay
            );

            tokio::select! {
                _ = tokio::time::sleep(decision.delay) => {}
                _ = control.cancelled() => return Err(HttpError::Cancelled),
            }
        }
    }
}

/// Header names are case-insensitive; a new value replaces any spelling
fn insert_header(headers: &mut Headers, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Body text for status errors, falling back to the reason phrase
fn status_message(body: &[u8], metadata: &ResponseMetadata) -> String {
    if body.is_empty() {
        metadata
            .status
            .canonical_reason()
            .unwrap_or_default()
            .to_owned()
    } else {
        String::from_utf8_lossy(body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::JsonObject;

    #[test]
    fn test_builder_defaults() {
        let service = HttpService::builder().build();
        assert_eq!(service.base_url(), None);
        assert!(service.value_key_path().is_none());
        assert!(service.error_key_path().is_none());
    }

    #[test]
    fn test_builder_key_paths() {
        let service = HttpService::builder()
            .base_url("https://api.example.com")
            .value_key_path("data")
            .error_key_path("error.details")
            .build();

        assert_eq!(service.base_url(), Some("https://api.example.com"));
        assert_eq!(service.value_key_path().map(|p| p.to_string()).as_deref(), Some("data"));
        assert_eq!(
            service.error_key_path().map(|p| p.to_string()).as_deref(),
            Some("error.details")
        );
    }

    #[test]
    fn test_call_key_paths_override_defaults() {
        let service = HttpService::builder()
            .value_key_path("data")
            .error_key_path("error")
            .build();

        let defaults = service.get("/a").transformer();
        assert_eq!(defaults.value_key_path().map(|p| p.to_string()).as_deref(), Some("data"));

        let overridden = service
            .get("/a")
            .value_key_path("result.items")
            .transformer();
        assert_eq!(
            overridden.value_key_path().map(|p| p.to_string()).as_deref(),
            Some("result.items")
        );
        assert_eq!(
            overridden.error_key_path().map(|p| p.to_string()).as_deref(),
            Some("error")
        );
    }

    #[test]
    fn test_empty_call_key_paths_clear_defaults() {
        let service = HttpService::builder()
            .value_key_path("data")
            .error_key_path("error")
            .build();

        let transformer = service
            .get("/a")
            .value_key_path("")
            .error_key_path("")
            .transformer();
        assert!(transformer.value_key_path().is_none());
        assert!(transformer.error_key_path().is_none());

        let response: Response<JsonObject> =
            transformer.transform(Some(&br#"{"id":1,"name":"root"}"#[..]), None, None);
        let value = response.value.expect("Whole document decodes");
        assert_eq!(value.get("name"), Some(&Value::from("root")));
    }

    #[test]
    fn test_endpoint_headers_override_defaults() {
        let service = HttpService::builder()
            .default_header("Accept", "application/json")
            .default_header("X-Tenant", "default")
            .endpoint_headers(|endpoint| {
                let mut headers = Headers::new();
                if endpoint.starts_with("/admin") {
                    headers.insert("x-tenant".to_string(), "admin".to_string());
                }
                headers
            })
            .build();

        let merged = |endpoint: &str| {
            merge_headers([
                &service.inner.default_headers,
                &service.endpoint_headers(endpoint),
            ])
            .expect("Valid headers")
        };

        let admin = merged("/admin/users");
        assert_eq!(admin.get("X-Tenant").and_then(|v| v.to_str().ok()), Some("admin"));
        assert_eq!(
            admin.get("Accept").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );

        let public = merged("/users");
        assert_eq!(public.get("x-tenant").and_then(|v| v.to_str().ok()), Some("default"));
    }

    #[test]
    fn test_call_header_replaces_any_spelling() {
        let service = HttpService::new("https://api.example.com");
        let request = service
            .get("/a")
            .header("Content-Type", "text/plain")
            .header("content-type", "application/json");

        assert_eq!(request.headers.len(), 1);
        assert_eq!(
            request.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_param_accumulates() {
        let service = HttpService::new("https://api.example.com");
        let request = service.get("/search").param("q", "rust").param("page", 2);

        let params = request.params.as_ref().expect("Params are set");
        assert_eq!(params.get("q"), Some(&Value::from("rust")));
        assert_eq!(params.get("page"), Some(&Value::from(2)));
    }

    #[test]
    fn test_status_message_fallback() {
        let metadata = ResponseMetadata {
            status: narwhal_http_client::StatusCode::NOT_FOUND,
            headers: Default::default(),
            url: url::Url::parse("https://api.example.com/").expect("Valid URL"),
        };

        assert_eq!(status_message(b"", &metadata), "Not Found");
        assert_eq!(status_message(b"{\"e\":1}", &metadata), "{\"e\":1}");
    }
}
