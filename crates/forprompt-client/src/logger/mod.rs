//! Conversation logging grouped into traces.

use forprompt_core::{Error, Result};
use forprompt_pii::{RedactionConfig, redact_pii};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::TRACING_TARGET_LOGGER;
use crate::config::ClientConfig;
use crate::executor::RequestExecutor;
use crate::transport::{HttpTransport, Method, ReqwestTransport, SharedTransport};

mod message;

use message::LogEvent;
pub use message::LogMessage;

/// Path of the log endpoint.
pub const LOG_PATH: &str = "/api/log";

/// Prompt key sent when no trace has named one.
pub const UNKNOWN_PROMPT_KEY: &str = "unknown";

/// Metadata key under which redaction summaries are attached.
pub const PII_REDACTIONS_KEY: &str = "pii_redactions";

#[derive(Debug, Clone, Default)]
struct TraceState {
    trace_id: Option<String>,
    prompt_key: Option<String>,
    version_number: Option<u32>,
}

/// Logs conversation turns to ForPrompt.
///
/// A logger holds at most one active trace. Logging without one starts an
/// anonymous trace with a fresh id. Message content is redacted with the
/// full PII catalog unless redaction is disabled in the configuration or
/// on the message. Each event is a single request; failed events are not
/// retried.
///
/// # Examples
///
/// ```rust,ignore
/// use forprompt_client::{ClientConfig, LogMessage, TraceLogger};
///
/// let mut logger = TraceLogger::new(ClientConfig::from_env())?;
/// let trace_id = logger.start_trace("support-bot", None, Some(3));
/// logger.log(LogMessage::user("My email is jane@example.com")).await?;
/// logger.end_trace();
/// ```
#[derive(Debug, Clone)]
pub struct TraceLogger {
    executor: RequestExecutor,
    trace: TraceState,
}

impl TraceLogger {
    /// Creates a logger over the default reqwest transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let config = config.validate()?;
        let transport = ReqwestTransport::new().map_err(|e| {
            Error::network_error(format!("Failed to create HTTP client: {e}")).with_source(e)
        })?;
        Ok(Self::from_executor(RequestExecutor::new(
            config,
            SharedTransport::new(transport),
        )))
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
        let config = config.validate()?;
        Ok(Self::from_executor(RequestExecutor::new(
            config,
            SharedTransport::new(transport),
        )))
    }

    pub(crate) fn from_executor(executor: RequestExecutor) -> Self {
        Self {
            executor,
            trace: TraceState::default(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        self.executor.config()
    }

    /// Starts a trace, replacing any active one, and returns its id.
    ///
    /// A fresh UUID v4 is used when `trace_id` is `None`.
    pub fn start_trace(
        &mut self,
        prompt_key: impl Into<String>,
        trace_id: Option<String>,
        version_number: Option<u32>,
    ) -> String {
        let trace_id = trace_id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(new_trace_id);
        let prompt_key = prompt_key.into();

        tracing::debug!(
            target: TRACING_TARGET_LOGGER,
            trace_id = %trace_id,
            prompt_key = %prompt_key,
            version_number,
            "Trace started"
        );

        self.trace = TraceState {
            trace_id: Some(trace_id.clone()),
            prompt_key: Some(prompt_key),
            version_number,
        };

        trace_id
    }

    /// Returns the active trace id.
    pub fn trace_id(&self) -> Option<&str> {
        self.trace.trace_id.as_deref()
    }

    /// Returns `true` while a trace is active.
    pub fn is_tracing(&self) -> bool {
        self.trace.trace_id.is_some()
    }

    /// Sends one conversation turn in the active trace.
    ///
    /// Fails with `LOG_ERROR` when the service rejects the event and with
    /// `NETWORK_ERROR` when no response arrives (timeouts included).
    pub async fn log(&mut self, message: LogMessage) -> Result<()> {
        let trace_id = match &self.trace.trace_id {
            Some(trace_id) if !trace_id.is_empty() => trace_id.clone(),
            _ => {
                let trace_id = new_trace_id();
                tracing::debug!(
                    target: TRACING_TARGET_LOGGER,
                    trace_id = %trace_id,
                    "Starting anonymous trace"
                );
                self.trace.trace_id = Some(trace_id.clone());
                trace_id
            }
        };

        let redact = message.redact_pii.unwrap_or(self.config().redact_pii);
        let mut metadata = message.metadata;
        let content = if redact {
            let result = redact_pii(&message.content, &RedactionConfig::default());
            if result.has_pii {
                metadata
                    .get_or_insert_with(Map::new)
                    .insert(PII_REDACTIONS_KEY.to_owned(), Value::from(result.redactions));
            }
            result.redacted
        } else {
            message.content
        };

        let event = LogEvent {
            trace_id: &trace_id,
            prompt_key: self
                .trace
                .prompt_key
                .as_deref()
                .unwrap_or(UNKNOWN_PROMPT_KEY),
            version_number: self.trace.version_number,
            event_type: "message",
            role: &message.role,
            content: &content,
            model: message.model.as_deref(),
            input_tokens: message.input_tokens,
            output_tokens: message.output_tokens,
            duration_ms: message.duration_ms,
            source: &self.config().source,
            metadata: metadata.as_ref(),
        };
        let body = serde_json::to_value(&event).map_err(|e| {
            Error::log_error(format!("Failed to encode log event: {e}"), 0).with_source(e)
        })?;

        match self.executor.send_once(Method::POST, LOG_PATH, body).await {
            Ok(response) if response.is_success() => {
                tracing::debug!(
                    target: TRACING_TARGET_LOGGER,
                    trace_id = %trace_id,
                    role = %message.role,
                    "Logged message"
                );
                Ok(())
            }
            Ok(response) => {
                let message = response
                    .error_field()
                    .unwrap_or_else(|| "Failed to log".to_owned());
                Err(Error::log_error(message, response.status))
            }
            Err(err) => {
                Err(Error::network_error(format!("Network error: {err}")).with_source(err))
            }
        }
    }

    /// Clears the active trace. Sends nothing.
    pub fn end_trace(&mut self) {
        if let Some(trace_id) = &self.trace.trace_id {
            tracing::debug!(
                target: TRACING_TARGET_LOGGER,
                trace_id = %trace_id,
                "Trace ended"
            );
        }
        self.trace = TraceState::default();
    }

    /// Logs a single message in its own trace and returns the trace id.
    ///
    /// Equivalent to [`start_trace`], [`log`] and [`end_trace`] in sequence.
    /// The trace is ended even when logging fails.
    ///
    /// [`start_trace`]: Self::start_trace
    /// [`log`]: Self::log
    /// [`end_trace`]: Self::end_trace
    pub async fn log_request(
        &mut self,
        prompt_key: impl Into<String>,
        message: LogMessage,
        version_number: Option<u32>,
    ) -> Result<String> {
        let trace_id = self.start_trace(prompt_key, None, version_number);
        let result = self.log(message).await;
        self.end_trace();
        result.map(|()| trace_id)
    }
}

fn new_trace_id() -> String {
    Uuid::new_v4().to_string()
}
