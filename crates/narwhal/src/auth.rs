//! Authentication headers and the 401 retry hook

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use narwhal_http_client::header::{HeaderName, HeaderValue};
use narwhal_http_client::{HeaderMap, HttpError, RequestDescriptor, ResponseMetadata};

/// Plain header mapping as supplied by callers, endpoints and auth managers
pub type Headers = HashMap<String, String>;

/// Whether and when to resend a request rejected with 401
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryDecision {
    /// Resend the request
    pub should_retry: bool,
    /// Wait before resending
    pub delay: Duration,
}

impl RetryDecision {
    /// Resend after `delay`
    pub fn retry_after(delay: Duration) -> Self {
        Self {
            should_retry: true,
            delay,
        }
    }

    /// Resend immediately
    pub fn retry() -> Self {
        Self::retry_after(Duration::ZERO)
    }

    /// Deliver the 401 as is
    pub fn give_up() -> Self {
        Self {
            should_retry: false,
            delay: Duration::ZERO,
        }
    }
}

/// Source of authentication headers and token refresh decisions
///
/// Implementations typically hold a token store: `headers` reads the current
/// token, `should_retry` refreshes it and asks for a resend.
#[async_trait]
pub trait AuthManager: fmt::Debug + Send + Sync {
    /// Headers merged into every outgoing request
    fn headers(&self) -> Headers;

    /// Called when a request was answered with 401
    ///
    /// Every positive decision resends the request with freshly computed
    /// headers; there is no upper bound on the number of attempts.
    async fn should_retry(
        &self,
        request: &RequestDescriptor,
        response: &ResponseMetadata,
    ) -> RetryDecision;
}

/// Merge header layers; later layers win on name collisions
///
/// Names are compared case-insensitively. The service passes endpoint
/// defaults, endpoint headers, then auth headers, then headers given on
/// the call. When one layer spells the same name twice, the spelling that
/// sorts last wins, so `b` beats `B`.
pub fn merge_headers<'a, I>(layers: I) -> Result<HeaderMap, HttpError>
where
    I: IntoIterator<Item = &'a Headers>,
{
    let mut merged = HeaderMap::new();

    for layer in layers {
        let mut entries: Vec<(&String, &String)> = layer.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (name, value) in entries {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::Build(format!("Invalid header name `{}`: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| HttpError::Build(format!("Invalid value for `{}`: {}", name, e)))?;
            merged.insert(name, value);
        }
    }

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn get<'a>(map: &'a HeaderMap, name: &str) -> Option<&'a str> {
        map.get(name).and_then(|value| value.to_str().ok())
    }

    #[test]
    fn test_merge_precedence() {
        let endpoint = headers(&[("A", "1"), ("B", "2")]);
        let auth = headers(&[("B", "3"), ("C", "4")]);
        let explicit = headers(&[("C", "5")]);

        let merged = merge_headers([&endpoint, &auth, &explicit]).expect("Valid headers");

        assert_eq!(merged.len(), 3);
        assert_eq!(get(&merged, "A"), Some("1"));
        assert_eq!(get(&merged, "B"), Some("3"));
        assert_eq!(get(&merged, "C"), Some("5"));
    }

    #[test]
    fn test_merge_is_case_insensitive() {
        let endpoint = headers(&[("Authorization", "Basic old")]);
        let auth = headers(&[("authorization", "Bearer new")]);

        let merged = merge_headers([&endpoint, &auth]).expect("Valid headers");

        assert_eq!(merged.len(), 1);
        assert_eq!(get(&merged, "AUTHORIZATION"), Some("Bearer new"));
    }

    #[test]
    fn test_merge_case_duplicates_within_layer() {
        for _ in 0..16 {
            let layer = headers(&[("B", "upper"), ("b", "lower"), ("a", "1")]);
            let merged = merge_headers([&layer]).expect("Valid headers");

            assert_eq!(merged.len(), 2);
            assert_eq!(get(&merged, "B"), Some("lower"));
        }
    }

    #[test]
    fn test_merge_rejects_invalid_name() {
        let bad = headers(&[("bad header", "x")]);
        let result = merge_headers([&bad]);

        assert!(matches!(result, Err(HttpError::Build(msg)) if msg.contains("bad header")));
    }

    #[test]
    fn test_retry_decisions() {
        assert_eq!(
            RetryDecision::retry_after(Duration::from_millis(5)),
            RetryDecision {
                should_retry: true,
                delay: Duration::from_millis(5)
            }
        );
        assert!(RetryDecision::retry().should_retry);
        assert!(!RetryDecision::give_up().should_retry);
    }
}
