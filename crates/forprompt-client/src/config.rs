//! Client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use forprompt_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://forprompt.dev";

/// Default per-attempt timeout: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Default number of attempts per fetch.
pub const DEFAULT_RETRIES: u32 = 3;

/// Default value of the `source` field on logged events.
pub const DEFAULT_SOURCE: &str = "rust-sdk";

/// Environment variable holding the project API key.
pub const API_KEY_ENV: &str = "FORPROMPT_API_KEY";

/// Environment variable overriding the service endpoint.
pub const BASE_URL_ENV: &str = "FORPROMPT_BASE_URL";

/// Configuration shared by [`ForPromptClient`] and [`TraceLogger`].
///
/// Use [`ClientConfig::from_env`] or [`ClientConfig::resolve`] to pick up the
/// `FORPROMPT_API_KEY` and `FORPROMPT_BASE_URL` environment variables.
/// The configuration is checked by [`ClientConfig::validate`] when a client
/// is built from it.
///
/// [`ForPromptClient`]: crate::ForPromptClient
/// [`TraceLogger`]: crate::TraceLogger
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ClientConfig {
    /// Project API key sent as `X-API-Key`
    #[cfg_attr(
        feature = "config",
        arg(
            long = "api-key",
            env = "FORPROMPT_API_KEY",
            hide_env_values = true,
            default_value = ""
        )
    )]
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the ForPrompt service
    #[cfg_attr(
        feature = "config",
        arg(long = "base-url", env = "FORPROMPT_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-attempt request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "timeout", env = "FORPROMPT_TIMEOUT", default_value = "30")
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Total number of attempts per prompt fetch
    #[cfg_attr(
        feature = "config",
        arg(long = "retries", env = "FORPROMPT_RETRIES", default_value = "3")
    )]
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Redact PII from logged message content
    #[cfg_attr(
        feature = "config",
        arg(
            long = "redact-pii",
            env = "FORPROMPT_REDACT_PII",
            default_value_t = true,
            action = clap::ArgAction::Set
        )
    )]
    #[serde(default = "default_redact_pii")]
    pub redact_pii: bool,

    /// Value of the `source` field on logged events
    #[cfg_attr(
        feature = "config",
        arg(long = "source", env = "FORPROMPT_SOURCE", default_value = DEFAULT_SOURCE)
    )]
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_redact_pii() -> bool {
    true
}

fn default_source() -> String {
    DEFAULT_SOURCE.to_owned()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            redact_pii: default_redact_pii(),
            source: default_source(),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.masked_api_key())
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("retries", &self.retries)
            .field("redact_pii", &self.redact_pii)
            .field("source", &self.source)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a configuration with the given API key and defaults elsewhere.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration from the environment.
    pub fn from_env() -> Self {
        Self::resolve(None, None)
    }

    /// Creates a configuration from explicit values, falling back to the
    /// environment and then to the defaults.
    ///
    /// Empty strings count as unset at every level.
    pub fn resolve(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self::resolve_with(api_key, base_url, |name| std::env::var(name).ok())
    }

    fn resolve_with(
        api_key: Option<String>,
        base_url: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.is_empty());
        Self {
            api_key: non_empty(api_key)
                .or_else(|| non_empty(lookup(API_KEY_ENV)))
                .unwrap_or_default(),
            base_url: non_empty(base_url)
                .or_else(|| non_empty(lookup(BASE_URL_ENV)))
                .unwrap_or_else(default_base_url),
            ..Self::default()
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-attempt timeout in seconds.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: f64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the total number of attempts per fetch.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Set whether logged content is redacted by default.
    #[must_use]
    pub fn with_redact_pii(mut self, redact_pii: bool) -> Self {
        self.redact_pii = redact_pii;
        self
    }

    /// Set the `source` field of logged events.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns the API key masked for display.
    ///
    /// Shows the first 4 characters followed by "****", or just "****"
    /// if the key is 4 characters or shorter.
    pub fn masked_api_key(&self) -> String {
        if self.api_key.chars().count() > 4 {
            let prefix: String = self.api_key.chars().take(4).collect();
            format!("{prefix}****")
        } else {
            "****".to_owned()
        }
    }

    /// Returns the per-attempt timeout as a Duration.
    ///
    /// Falls back to the default for values that are not a valid duration.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS))
    }

    /// Checks the configuration and normalizes the base URL.
    ///
    /// Fails with `MISSING_API_KEY` when no key is set and with
    /// `INVALID_INPUT` when the timeout is not a positive number of seconds.
    /// Trailing `/` characters are stripped from the base URL.
    pub fn validate(mut self) -> Result<Self> {
        if self.api_key.is_empty() {
            return Err(Error::missing_api_key());
        }

        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(Error::invalid_input(format!(
                "Timeout must be a positive number of seconds, got {}",
                self.timeout_secs
            )));
        }

        self.base_url = self.base_url.trim_end_matches('/').to_owned();

        Ok(self)
    }

    /// Joins an API path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
