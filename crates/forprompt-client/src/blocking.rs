//! Synchronous wrappers around the async client and logger.
//!
//! Each wrapper owns a current-thread tokio runtime and blocks on it.
//! Like other blocking clients, these must not be used from within an
//! async runtime.

use std::collections::HashMap;
use std::sync::Arc;

use forprompt_core::{Error, Prompt, Result};
use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::logger::LogMessage;
use crate::transport::HttpTransport;

fn runtime() -> Result<Arc<Runtime>> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map(Arc::new)
        .map_err(|e| Error::network_error(format!("Failed to start runtime: {e}")).with_source(e))
}

/// Blocking counterpart of [`crate::ForPromptClient`].
#[derive(Debug, Clone)]
pub struct ForPromptClient {
    inner: crate::ForPromptClient,
    runtime: Arc<Runtime>,
}

impl ForPromptClient {
    /// Creates a client over the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            inner: crate::ForPromptClient::new(config)?,
            runtime: runtime()?,
        })
    }

    /// Creates a client from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Creates a client over a custom transport.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: HttpTransport + 'static,
    {
        Ok(Self {
            inner: crate::ForPromptClient::with_transport(config, transport)?,
            runtime: runtime()?,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        self.inner.config()
    }

    /// Fetches a prompt by key, optionally pinned to a version.
    pub fn get_prompt(&self, key: &str, version: Option<u32>) -> Result<Prompt> {
        self.runtime.block_on(self.inner.get_prompt(key, version))
    }

    /// Fetches several prompts one after another.
    ///
    /// Keys that fail are left out of the result.
    pub fn get_prompts<I, S>(&self, keys: I, version: Option<u32>) -> HashMap<String, Prompt>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut prompts = HashMap::new();
        for key in keys {
            let key = key.into();
            if let Ok(prompt) = self.get_prompt(&key, version) {
                prompts.insert(key, prompt);
            }
        }
        prompts
    }

    /// Returns a trace logger sharing this client's runtime and transport.
    pub fn logger(&self) -> TraceLogger {
        TraceLogger {
            inner: self.inner.logger(),
            runtime: self.runtime.clone(),
        }
    }
}

/// Blocking counterpart of [`crate::TraceLogger`].
#[derive(Debug)]
pub struct TraceLogger {
    inner: crate::TraceLogger,
    runtime: Arc<Runtime>,
}

impl TraceLogger {
    /// Creates a logger over the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            inner: crate::TraceLogger::new(config)?,
            runtime: runtime()?,
        })
    }

    /// Creates a logger from the environment.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Creates a logger over a custom transport.
    pub fn with_transport<T>(config: ClientConfig, transport: T) -> Result<Self>
    where
        T: HttpTransport + 'static,
    {
        Ok(Self {
            inner: crate::TraceLogger::with_transport(config, transport)?,
            runtime: runtime()?,
        })
    }

    /// See [`crate::TraceLogger::start_trace`].
    pub fn start_trace(
        &mut self,
        prompt_key: impl Into<String>,
        trace_id: Option<String>,
        version_number: Option<u32>,
    ) -> String {
        self.inner.start_trace(prompt_key, trace_id, version_number)
    }

    /// Returns the current trace id, if any.
    pub fn trace_id(&self) -> Option<&str> {
        self.inner.trace_id()
    }

    /// Returns `true` while a trace is active.
    pub fn is_tracing(&self) -> bool {
        self.inner.is_tracing()
    }

    /// See [`crate::TraceLogger::log`].
    pub fn log(&mut self, message: LogMessage) -> Result<()> {
        self.runtime.block_on(self.inner.log(message))
    }

    /// Clears the current trace.
    pub fn end_trace(&mut self) {
        self.inner.end_trace();
    }

    /// See [`crate::TraceLogger::log_request`].
    pub fn log_request(
        &mut self,
        prompt_key: impl Into<String>,
        message: LogMessage,
        version_number: Option<u32>,
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.log_request(prompt_key, message, version_number))
    }
}

#[cfg(test)]
mod tests {
    use forprompt_core::ErrorKind;
    use serde_json::json;

    use super::*;
    use crate::transport::{MockReply, MockTransport};

    fn config() -> ClientConfig {
        ClientConfig::new("fp_test").with_retries(1)
    }

    #[test]
    fn test_blocking_get_prompt() {
        let mock = MockTransport::new();
        mock.push_json(
            200,
            json!({
                "key": "greeting",
                "name": "Greeting",
                "versionNumber": 1,
                "systemPrompt": "Hi",
                "updatedAt": 0,
            }),
        );

        let client = ForPromptClient::with_transport(config(), mock.clone()).unwrap();
        let prompt = client.get_prompt("greeting", None).unwrap();
        assert_eq!(prompt.system_prompt, "Hi");
    }

    #[test]
    fn test_blocking_get_prompts_sequential() {
        let mock = MockTransport::new().with_handler(|request| {
            let key = request.query_param("key").unwrap_or_default();
            if key == "missing" {
                return MockReply::json(404, json!({"error": "not found"}));
            }
            MockReply::json(
                200,
                json!({
                    "key": key,
                    "name": key,
                    "versionNumber": 1,
                    "systemPrompt": "",
                    "updatedAt": 0,
                }),
            )
        });

        let client = ForPromptClient::with_transport(config(), mock.clone()).unwrap();
        let prompts = client.get_prompts(["a", "missing", "b"], None);

        assert_eq!(prompts.len(), 2);
        assert_eq!(mock.max_in_flight(), 1);
        let keys: Vec<_> = mock
            .requests()
            .iter()
            .filter_map(|r| r.query_param("key").map(str::to_owned))
            .collect();
        assert_eq!(keys, ["a", "missing", "b"]);
    }

    #[test]
    fn test_blocking_logger() {
        let mock = MockTransport::new();
        mock.push_json(200, json!({}));
        mock.push_json(401, json!({"error": "bad key"}));

        let client = ForPromptClient::with_transport(config(), mock.clone()).unwrap();
        let mut logger = client.logger();

        let trace_id = logger.start_trace("bot", None, None);
        logger.log(LogMessage::user("hi")).unwrap();
        assert_eq!(logger.trace_id(), Some(trace_id.as_str()));

        let error = logger.log(LogMessage::user("again")).unwrap_err();
        assert_eq!(error.kind, ErrorKind::LogError);

        logger.end_trace();
        assert!(!logger.is_tracing());
    }
}
