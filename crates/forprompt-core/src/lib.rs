#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod error;
mod prompt;

pub mod prelude;

pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::prompt::{MAX_KEY_LENGTH, Prompt};
