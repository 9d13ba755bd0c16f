#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for client operations
pub const TRACING_TARGET_CLIENT: &str = "forprompt_client::client";

/// Tracing target for request execution and retries
pub const TRACING_TARGET_EXECUTOR: &str = "forprompt_client::executor";

/// Tracing target for trace logging
pub const TRACING_TARGET_LOGGER: &str = "forprompt_client::logger";

/// Tracing target for the HTTP transport
pub const TRACING_TARGET_TRANSPORT: &str = "forprompt_client::transport";

pub mod blocking;
mod client;
mod config;
mod executor;
mod logger;
#[doc(hidden)]
pub mod prelude;
mod retry;
pub mod transport;

pub use forprompt_core::{Error, ErrorKind, MAX_KEY_LENGTH, Prompt, Result};
pub use forprompt_pii::{
    PiiPattern, RedactionConfig, RedactionResult, available_patterns, contains_pii, redact_pii,
};

pub use crate::client::{
    BULK_CONCURRENCY_LIMIT, ForPromptClient, PROMPTS_PATH, validate_prompt_request,
};
pub use crate::config::{
    API_KEY_ENV, BASE_URL_ENV, ClientConfig, DEFAULT_BASE_URL, DEFAULT_RETRIES, DEFAULT_SOURCE,
    DEFAULT_TIMEOUT_SECS,
};
pub use crate::executor::API_KEY_HEADER;
pub use crate::logger::{LOG_PATH, LogMessage, PII_REDACTIONS_KEY, TraceLogger, UNKNOWN_PROMPT_KEY};
pub use crate::retry::RetryPolicy;
