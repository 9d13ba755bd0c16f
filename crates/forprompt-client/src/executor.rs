//! Authenticated request execution against the ForPrompt API.

use std::sync::Arc;

use forprompt_core::{Error, Result};
use serde_json::Value;

use crate::TRACING_TARGET_EXECUTOR;
use crate::config::ClientConfig;
use crate::retry::RetryPolicy;
use crate::transport::{
    ApiRequest, ApiResponse, HttpTransport, Method, SharedTransport, TransportError,
};

/// Header carrying the project API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

struct ExecutorInner {
    config: ClientConfig,
    transport: SharedTransport,
    policy: RetryPolicy,
}

/// Builds authenticated requests and sends them through the transport.
///
/// Cloning is cheap; clones share configuration and transport.
#[derive(Clone)]
pub struct RequestExecutor {
    inner: Arc<ExecutorInner>,
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.inner.config)
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl RequestExecutor {
    /// Creates an executor from an already validated configuration.
    pub(crate) fn new(config: ClientConfig, transport: SharedTransport) -> Self {
        let policy = RetryPolicy::new(config.retries);
        let inner = ExecutorInner {
            config,
            transport,
            policy,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn request(&self, method: Method, path: &str) -> ApiRequest {
        let config = self.config();
        ApiRequest::new(method, config.endpoint(path), config.timeout())
            .with_header("Content-Type", "application/json")
            .with_header(API_KEY_HEADER, config.api_key.clone())
    }

    /// Sends a request with retries and returns the decoded JSON body.
    ///
    /// - `2xx`: the body is parsed as JSON (an empty body is `null`).
    /// - `404`: `PROMPT_NOT_FOUND`, other `4xx`: `API_ERROR`; never retried.
    /// - `5xx` and network failures: retried with backoff.
    /// - Timeouts: `TIMEOUT`, never retried.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value> {
        let mut request = self.request(method, path);
        for (name, value) in query {
            request = request.with_query(*name, value.clone());
        }
        if let Some(body) = body {
            request = request.with_body(body);
        }

        self.inner
            .policy
            .retry(|attempt| {
                let request = request.clone();
                async move {
                    tracing::debug!(
                        target: TRACING_TARGET_EXECUTOR,
                        method = %request.method,
                        url = %request.url,
                        attempt,
                        "Sending request"
                    );
                    self.attempt(request).await
                }
            })
            .await
    }

    async fn attempt(&self, request: ApiRequest) -> Result<Value> {
        match self.inner.transport.send(request).await {
            Ok(response) => classify(response),
            Err(TransportError::Timeout) => Err(Error::timeout(format!(
                "Request timeout after {}s",
                self.config().timeout_secs
            ))),
            Err(err) => Err(Error::network_error(err.to_string()).with_source(err)),
        }
    }

    /// Sends a single request without retries.
    pub async fn send_once(
        &self,
        method: Method,
        path: &str,
        body: Value,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let request = self.request(method, path).with_body(body);
        tracing::debug!(
            target: TRACING_TARGET_EXECUTOR,
            method = %request.method,
            url = %request.url,
            "Sending request once"
        );
        self.inner.transport.send(request).await
    }
}

fn classify(response: ApiResponse) -> Result<Value> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body).map_err(|e| {
            Error::api_error(format!("Invalid JSON response: {e}"), response.status).with_source(e)
        });
    }

    if response.is_client_error() {
        let message = match response.body_json() {
            Some(_) => response
                .error_field()
                .unwrap_or_else(|| format!("HTTP {}", response.status)),
            None => "Unknown error".to_owned(),
        };

        return Err(if response.status == 404 {
            Error::prompt_not_found(message)
        } else {
            Error::api_error(message, response.status)
        });
    }

    Err(Error::server_error(response.status))
}
