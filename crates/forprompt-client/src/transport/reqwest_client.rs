//! Reqwest-backed transport.

use async_trait::async_trait;
use reqwest::Client;

use super::{ApiRequest, ApiResponse, HttpTransport, TransportError};
use crate::TRACING_TARGET_TRANSPORT;

/// [`HttpTransport`] over a pooled [`reqwest::Client`].
///
/// The client has no global timeout; each request carries its own, so
/// every retry attempt gets a fresh window.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Creates a transport with the default user agent.
    pub fn new() -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(Self::default_user_agent())
            .build()?;

        tracing::debug!(
            target: TRACING_TARGET_TRANSPORT,
            "Reqwest transport created"
        );

        Ok(Self { http })
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(http: Client) -> Self {
        Self { http }
    }

    fn default_user_agent() -> String {
        format!("forprompt-rust/{}", env!("CARGO_PKG_VERSION"))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::trace!(
            target: TRACING_TARGET_TRANSPORT,
            method = %request.method,
            url = %request.url,
            "Sending request"
        );

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        tracing::trace!(
            target: TRACING_TARGET_TRANSPORT,
            status,
            body_len = body.len(),
            "Received response"
        );

        Ok(ApiResponse { status, body })
    }
}
