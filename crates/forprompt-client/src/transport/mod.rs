//! HTTP transport abstraction.
//!
//! The executor and the logger talk to the service through
//! [`HttpTransport`], so the wire client can be swapped for an in-memory
//! one in tests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
pub use reqwest::Method;
use serde_json::Value;

mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod reqwest_client;

pub use error::TransportError;
#[cfg(any(test, feature = "mock"))]
#[cfg_attr(docsrs, doc(cfg(feature = "mock")))]
pub use mock::{MockReply, MockTransport};
pub use reqwest_client::ReqwestTransport;

/// A single HTTP request as built by the executor.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters in insertion order.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// JSON body, if any.
    pub body: Option<Value>,
    /// Timeout for this attempt.
    pub timeout: Duration,
}

impl ApiRequest {
    /// Creates a request without query, headers or body.
    pub fn new(method: Method, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Returns the first header with the given name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first query parameter with the given name.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl ApiResponse {
    /// Creates a response from a status and a text body.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Creates a response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self::new(status, body.to_string())
    }

    /// Returns `true` for `2xx` statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` for `4xx` statuses.
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Parses the body as JSON.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }

    /// Returns the `error` field of a JSON body.
    ///
    /// `None` when the body is not JSON or has no `error` field.
    pub fn error_field(&self) -> Option<String> {
        self.body_json()
            .as_ref()
            .and_then(|body| body.get("error"))
            .map(|error| match error {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

/// Sends requests to the ForPrompt service.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// Only failures that produced no HTTP response are errors.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

/// Type-erased transport shared between clients.
#[derive(Clone)]
pub struct SharedTransport {
    inner: Arc<dyn HttpTransport>,
}

impl SharedTransport {
    /// Wraps a transport.
    pub fn new<T: HttpTransport + 'static>(transport: T) -> Self {
        Self {
            inner: Arc::new(transport),
        }
    }
}

impl fmt::Debug for SharedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl HttpTransport for SharedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.inner.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_request_lookups() {
        let request = ApiRequest::new(
            Method::GET,
            "https://forprompt.dev/api/prompts",
            Duration::from_secs(1),
        )
        .with_query("key", "greeting")
        .with_header("X-API-Key", "fp_key");

        assert_eq!(request.query_param("key"), Some("greeting"));
        assert_eq!(request.query_param("version"), None);
        assert_eq!(request.header("x-api-key"), Some("fp_key"));
    }

    #[test]
    fn test_response_classes() {
        assert!(ApiResponse::new(204, "").is_success());
        assert!(ApiResponse::new(404, "").is_client_error());
        assert!(!ApiResponse::new(500, "").is_client_error());
        assert!(!ApiResponse::new(500, "").is_success());
    }

    #[test]
    fn test_error_field() {
        let response = ApiResponse::json(400, &json!({"error": "bad key"}));
        assert_eq!(response.error_field().as_deref(), Some("bad key"));

        let response = ApiResponse::json(400, &json!({"message": "nope"}));
        assert!(response.body_json().is_some());
        assert!(response.error_field().is_none());

        let response = ApiResponse::new(400, "<html>");
        assert!(response.body_json().is_none());
        assert!(response.error_field().is_none());
    }
}
