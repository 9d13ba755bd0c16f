//! Scriptable in-memory transport.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, ApiResponse, HttpTransport, TransportError};

type Handler = Arc<dyn Fn(&ApiRequest) -> MockReply + Send + Sync>;

/// Scripted outcome of a single mock request.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// An HTTP response.
    Response(ApiResponse),
    /// A timeout.
    Timeout,
    /// A network failure with the given message.
    Network(String),
}

impl MockReply {
    /// A response with a JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self::Response(ApiResponse::json(status, &body))
    }

    /// A response with a raw text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::Response(ApiResponse::new(status, body))
    }
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    handler: Option<Handler>,
    requests: Vec<ApiRequest>,
    latency: Option<Duration>,
    in_flight: usize,
    max_in_flight: usize,
}

/// [`HttpTransport`] that replays scripted replies and records requests.
///
/// Queued replies are used first, in order; once the queue is empty the
/// handler (if any) answers. Without either, requests fail with a network
/// error. Clones share state.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MockTransport")
            .field("queued", &state.replies.len())
            .field("calls", &state.requests.len())
            .finish_non_exhaustive()
    }
}

impl MockTransport {
    /// Creates an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply.
    pub fn push(&self, reply: MockReply) -> &Self {
        self.state().replies.push_back(reply);
        self
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) -> &Self {
        self.push(MockReply::json(status, body))
    }

    /// Queue a timeout.
    pub fn push_timeout(&self) -> &Self {
        self.push(MockReply::Timeout)
    }

    /// Queue a network failure.
    pub fn push_network_error(&self, message: impl Into<String>) -> &Self {
        self.push(MockReply::Network(message.into()))
    }

    /// Answer requests with `handler` once the queue is empty.
    #[must_use]
    pub fn with_handler<F>(self, handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> MockReply + Send + Sync + 'static,
    {
        self.state().handler = Some(Arc::new(handler));
        self
    }

    /// Delay every reply by `latency`.
    #[must_use]
    pub fn with_latency(self, latency: Duration) -> Self {
        self.state().latency = Some(latency);
        self
    }

    /// Returns every request received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.state().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    /// Returns the highest number of requests that were in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.state().max_in_flight
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let (reply, latency) = {
            let mut state = self.state();
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);

            let reply = match state.replies.pop_front() {
                Some(reply) => Some(reply),
                None => state.handler.as_ref().map(|handler| handler(&request)),
            };
            state.requests.push(request);
            (reply, state.latency)
        };

        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.state().in_flight -= 1;

        match reply {
            Some(MockReply::Response(response)) => Ok(response),
            Some(MockReply::Timeout) => Err(TransportError::Timeout),
            Some(MockReply::Network(message)) => Err(TransportError::network(message)),
            None => Err(TransportError::network("no mock reply scripted")),
        }
    }
}
