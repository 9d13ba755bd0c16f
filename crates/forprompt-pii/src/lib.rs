#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for redaction diagnostics.
pub const TRACING_TARGET: &str = "forprompt_pii";

mod pattern;
mod redact;

pub use crate::pattern::PiiPattern;
pub use crate::redact::{
    RedactionConfig, RedactionResult, available_patterns, contains_pii, redact_pii,
};
