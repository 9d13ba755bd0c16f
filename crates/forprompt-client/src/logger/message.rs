//! Conversation turns and the log event payload.

use serde::Serialize;
use serde_json::{Map, Value};

/// One conversation turn to be logged.
///
/// # Examples
///
/// ```rust
/// use forprompt_client::LogMessage;
///
/// let message = LogMessage::assistant("Hi there!")
///     .with_model("gpt-4o")
///     .with_input_tokens(10)
///     .with_output_tokens(4);
/// assert_eq!(message.role, "assistant");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogMessage {
    /// Speaker role, e.g. `user`, `assistant` or `system`.
    pub role: String,
    /// Message text.
    pub content: String,
    /// Model that produced the message.
    pub model: Option<String>,
    /// Prompt token count.
    pub input_tokens: Option<u64>,
    /// Completion token count.
    pub output_tokens: Option<u64>,
    /// Generation latency in milliseconds.
    pub duration_ms: Option<u64>,
    /// Caller metadata sent alongside the event.
    pub metadata: Option<Map<String, Value>>,
    /// Per-message override of the logger's redaction setting.
    pub redact_pii: Option<bool>,
}

impl LogMessage {
    /// Creates a message with the given role and content.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Creates a `user` message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Creates an `assistant` message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Creates a `system` message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_input_tokens(mut self, tokens: u64) -> Self {
        self.input_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn with_output_tokens(mut self, tokens: u64) -> Self {
        self.output_tokens = Some(tokens);
        self
    }

    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Replace the metadata map.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Add a single metadata entry.
    #[must_use]
    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Force redaction on or off for this message.
    #[must_use]
    pub fn with_redact_pii(mut self, redact_pii: bool) -> Self {
        self.redact_pii = Some(redact_pii);
        self
    }
}

/// Body of a `POST /api/log` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LogEvent<'a> {
    pub trace_id: &'a str,
    pub prompt_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_number: Option<u32>,
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub role: &'a str,
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a Map<String, Value>>,
}
