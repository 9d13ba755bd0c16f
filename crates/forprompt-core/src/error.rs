//! Structured error handling shared by every forprompt component.

use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur in forprompt operations.
///
/// The string form of each kind is the wire code used by the ForPrompt
/// service and the other SDKs (e.g. `PROMPT_NOT_FOUND`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// No API key was supplied or resolvable from the environment.
    MissingApiKey,
    /// Caller-supplied input failed validation.
    InvalidInput,
    /// The service answered `404` for the requested prompt.
    PromptNotFound,
    /// The service rejected the request with a non-404 `4xx`.
    ApiError,
    /// An attempt did not complete within the configured timeout.
    Timeout,
    /// The request never produced an HTTP response.
    NetworkError,
    /// The service answered with a `5xx`.
    ServerError,
    /// Every attempt failed without a recorded error.
    RetryExhausted,
    /// The log endpoint rejected an event.
    LogError,
}

impl ErrorKind {
    /// Returns `true` if another attempt may succeed.
    ///
    /// Timeouts are deliberately not retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerError | Self::NetworkError)
    }
}

/// Structured error type carrying a kind, a message and an HTTP-like status.
///
/// `status` is `0` when the failure is not derived from an HTTP response.
#[must_use]
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// HTTP status code, or `0` if not applicable.
    pub status: u16,
    /// Underlying source error, kept for diagnostics.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind, message and status.
    pub fn new(kind: ErrorKind, message: impl Into<String>, status: u16) -> Self {
        Self {
            kind,
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Sets the source of the error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a missing API key error (`401`).
    pub fn missing_api_key() -> Self {
        Self::new(
            ErrorKind::MissingApiKey,
            "API key is required. Set FORPROMPT_API_KEY environment variable or pass api_key parameter.",
            401,
        )
    }

    /// Creates an invalid input error (`400`).
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message, 400)
    }

    /// Creates a prompt not found error (`404`).
    pub fn prompt_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PromptNotFound, message, 404)
    }

    /// Creates an API error for a rejected request.
    pub fn api_error(message: impl Into<String>, status: u16) -> Self {
        Self::new(ErrorKind::ApiError, message, status)
    }

    /// Creates a timeout error (`408`).
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message, 408)
    }

    /// Creates a network error (`0`).
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message, 0)
    }

    /// Creates a server error for a `5xx` response.
    pub fn server_error(status: u16) -> Self {
        Self::new(ErrorKind::ServerError, format!("Server error: {status}"), status)
    }

    /// Creates a retry exhausted error (`500`).
    pub fn retry_exhausted() -> Self {
        Self::new(ErrorKind::RetryExhausted, "Request failed after retries", 500)
    }

    /// Creates a log error for a rejected log event.
    pub fn log_error(message: impl Into<String>, status: u16) -> Self {
        Self::new(ErrorKind::LogError, message, status)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as its wire code.
    pub fn code(&self) -> &'static str {
        self.kind.into()
    }

    /// Check if this error is retryable based on its kind.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_error_new() {
        let error = Error::new(ErrorKind::ApiError, "bad request", 400);
        assert_eq!(error.kind(), ErrorKind::ApiError);
        assert_eq!(error.message, "bad request");
        assert_eq!(error.status, 400);
        assert!(error.source.is_none());
    }

    #[test]
    fn test_error_display() {
        let error = Error::prompt_not_found("not found");
        assert_eq!(error.to_string(), "PROMPT_NOT_FOUND: not found");
    }

    #[test]
    fn test_default_statuses() {
        assert_eq!(Error::missing_api_key().status, 401);
        assert_eq!(Error::invalid_input("x").status, 400);
        assert_eq!(Error::timeout("x").status, 408);
        assert_eq!(Error::network_error("x").status, 0);
        assert_eq!(Error::retry_exhausted().status, 500);
        assert_eq!(Error::server_error(503).status, 503);
        assert_eq!(Error::server_error(503).message, "Server error: 503");
    }

    #[test]
    fn test_codes() {
        assert_eq!(Error::missing_api_key().code(), "MISSING_API_KEY");
        assert_eq!(ErrorKind::RetryExhausted.as_ref(), "RETRY_EXHAUSTED");
        assert_eq!(ErrorKind::LogError.to_string(), "LOG_ERROR");
        assert_eq!(
            ErrorKind::from_str("NETWORK_ERROR").unwrap(),
            ErrorKind::NetworkError
        );
        assert!(ErrorKind::from_str("network_error").is_err());
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::ServerError.is_retryable());
        assert!(ErrorKind::NetworkError.is_retryable());

        assert!(!ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::PromptNotFound.is_retryable());
        assert!(!ErrorKind::ApiError.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
    }

    #[test]
    fn test_with_source() {
        let source = std::io::Error::other("connection reset");
        let error = Error::network_error("connection reset").with_source(source);
        assert!(error.source.is_some());
        assert!(error.is_retryable());
    }
}
