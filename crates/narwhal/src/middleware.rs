//! Response middlewares, evaluated before transformation

use std::fmt;
use std::sync::Arc;

use narwhal_http_client::{RequestDescriptor, ResponseMetadata};

/// Snapshot of a finished exchange handed to each middleware
#[derive(Debug, Clone, Default)]
pub struct MiddlewareResponse {
    /// Raw response body
    pub body: Option<Vec<u8>>,
    /// Request as sent
    pub request: Option<RequestDescriptor>,
    /// Response status and headers
    pub response: Option<ResponseMetadata>,
}

/// Verdict of a middleware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareResult {
    /// Hand the response to the next middleware
    Continue,
    /// Stop processing; the response is not delivered
    Abort,
}

/// Hook inspecting every response before it is transformed
pub trait Middleware: Send + Sync {
    /// Inspect `response` and decide whether processing continues
    fn handle(&self, response: &MiddlewareResponse) -> MiddlewareResult;
}

impl<F> Middleware for F
where
    F: Fn(&MiddlewareResponse) -> MiddlewareResult + Send + Sync,
{
    fn handle(&self, response: &MiddlewareResponse) -> MiddlewareResult {
        self(response)
    }
}

/// Ordered list of middlewares with short-circuit evaluation
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("len", &self.middlewares.len())
            .finish()
    }
}

impl MiddlewareChain {
    /// Empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware; it runs after the ones already registered
    pub fn push<M>(&mut self, middleware: M)
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
    }

    /// Number of registered middlewares
    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    /// `true` when no middleware is registered
    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    /// Run the middlewares in registration order, stopping at the first abort
    pub fn evaluate(&self, response: &MiddlewareResponse) -> MiddlewareResult {
        for (index, middleware) in self.middlewares.iter().enumerate() {
            if middleware.handle(response) == MiddlewareResult::Abort {
                tracing::debug!("Response middleware {} aborted processing", index);
                return MiddlewareResult::Abort;
            }
        }

        MiddlewareResult::Continue
    }
}

/// Logs every response at debug level and always continues
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMiddleware;

impl Middleware for TraceMiddleware {
    fn handle(&self, response: &MiddlewareResponse) -> MiddlewareResult {
        let size = response.body.as_ref().map_or(0, Vec::len);

        match (&response.request, &response.response) {
            (Some(request), Some(metadata)) => tracing::debug!(
                "{} {} -> {} ({} bytes)",
                request.method,
                request.url,
                metadata.status,
                size
            ),
            (None, Some(metadata)) => {
                tracing::debug!("{} -> {} ({} bytes)", metadata.url, metadata.status, size)
            }
            (Some(request), None) => {
                tracing::debug!("{} {} -> no response", request.method, request.url)
            }
            (None, None) => tracing::debug!("No response received"),
        }

        MiddlewareResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting(
        calls: &Arc<AtomicUsize>,
        result: MiddlewareResult,
    ) -> impl Fn(&MiddlewareResponse) -> MiddlewareResult + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            result
        }
    }

    #[test]
    fn test_empty_chain_continues() {
        let chain = MiddlewareChain::new();
        assert!(chain.is_empty());
        assert_eq!(
            chain.evaluate(&MiddlewareResponse::default()),
            MiddlewareResult::Continue
        );
    }

    #[test]
    fn test_abort_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let after_abort = Arc::new(AtomicUsize::new(0));

        let mut chain = MiddlewareChain::new();
        chain.push(counting(&calls, MiddlewareResult::Continue));
        chain.push(counting(&calls, MiddlewareResult::Abort));
        chain.push(counting(&after_abort, MiddlewareResult::Continue));

        assert_eq!(chain.len(), 3);
        assert_eq!(
            chain.evaluate(&MiddlewareResponse::default()),
            MiddlewareResult::Abort
        );
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(after_abort.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_middleware_sees_body() {
        let mut chain = MiddlewareChain::new();
        chain.push(|response: &MiddlewareResponse| match response.body.as_deref() {
            Some(b"maintenance") => MiddlewareResult::Abort,
            _ => MiddlewareResult::Continue,
        });
        chain.push(TraceMiddleware);

        let blocked = MiddlewareResponse {
            body: Some(b"maintenance".to_vec()),
            ..Default::default()
        };
        let allowed = MiddlewareResponse {
            body: Some(b"{}".to_vec()),
            ..Default::default()
        };

        assert_eq!(chain.evaluate(&blocked), MiddlewareResult::Abort);
        assert_eq!(chain.evaluate(&allowed), MiddlewareResult::Continue);
    }
}
