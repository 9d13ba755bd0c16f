//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── client: ClientConfig   # API key, base URL, timeout, retries, redaction
//! ├── log_format: LogFormat  # stderr diagnostics format
//! └── command: Command       # get | get-many | log | redact | patterns
//! ```
//!
//! Client settings can be provided via CLI arguments or environment
//! variables (`FORPROMPT_API_KEY`, `FORPROMPT_BASE_URL`, ...).

use std::process;

use clap::{Parser, ValueEnum};
use forprompt_client::ClientConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::TRACING_TARGET_CONFIG;
use crate::command::Command;

/// Format of diagnostic output on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "forprompt")]
#[command(about = "Fetch prompts, log conversations and redact PII with ForPrompt")]
#[command(version)]
pub struct Cli {
    /// Client connection and logging configuration.
    #[clap(flatten)]
    pub client: ClientConfig,

    /// Diagnostic output format
    #[arg(long = "log-format", env = "FORPROMPT_LOG_FORMAT", value_enum, default_value_t)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing on stderr with environment-based filtering.
    ///
    /// Defaults to `warn` so stdout stays reserved for command output.
    pub fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let registry = tracing_subscriber::registry().with(filter);

        match self.log_format {
            LogFormat::Pretty => registry
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init(),
            LogFormat::Json => registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init(),
        }
    }

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            base_url = %self.client.base_url,
            api_key = %self.client.masked_api_key(),
            timeout_secs = self.client.timeout_secs,
            retries = self.client.retries,
            redact_pii = self.client.redact_pii,
            source = %self.client.source,
            command = self.command.name(),
            "Client configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
