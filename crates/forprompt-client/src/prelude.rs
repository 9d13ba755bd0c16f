//! Prelude module for forprompt-client.
//!
//! Re-exports the types most callers need: the client, the logger, their
//! configuration and the error types.

pub use crate::config::ClientConfig;
pub use crate::logger::{LogMessage, TraceLogger};
pub use crate::{Error, ErrorKind, ForPromptClient, Prompt, Result};
