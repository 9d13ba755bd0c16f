//! Transport-level failures.

use forprompt_core::BoxedError;
use thiserror::Error;

/// A request that produced no HTTP response.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The attempt did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,
    /// Connection, DNS, TLS or other transport failure.
    #[error("{message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },
}

impl TransportError {
    /// Creates a network failure without a source.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Returns `true` for timeouts.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }

        let message = if err.is_connect() {
            "Connection failed".to_owned()
        } else {
            err.to_string()
        };

        Self::Network {
            message,
            source: Some(Box::new(err)),
        }
    }
}
