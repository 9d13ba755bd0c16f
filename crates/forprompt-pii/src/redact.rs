//! Redaction and detection over the pattern catalog.

use std::collections::HashMap;

use regex::NoExpand;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::TRACING_TARGET;
use crate::pattern::PiiPattern;

/// Configuration for a single redaction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionConfig {
    /// Whether redaction runs at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Pattern names to apply; `None` or empty applies the whole catalog.
    ///
    /// Unknown names are ignored.
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
    /// Emit a diagnostic event with the redaction summary when PII is found.
    #[serde(default)]
    pub log_stats: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            patterns: None,
            log_stats: false,
        }
    }
}

impl RedactionConfig {
    /// A configuration that leaves content untouched.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Restrict redaction to the named patterns.
    #[must_use]
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = Some(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// Set whether the redaction summary is logged.
    #[must_use]
    pub fn with_log_stats(mut self, log_stats: bool) -> Self {
        self.log_stats = log_stats;
        self
    }

    /// Returns the selected patterns in catalog order.
    pub fn selected(&self) -> Vec<PiiPattern> {
        match &self.patterns {
            Some(names) => select(names),
            None => PiiPattern::iter().collect(),
        }
    }
}

/// Outcome of a redaction call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// The content with every match replaced by its token.
    pub redacted: String,
    /// One `"<name>: <count> instance(s)"` entry per matching pattern, in
    /// catalog order.
    pub redactions: Vec<String>,
    /// Match count per pattern name.
    pub counts: HashMap<String, usize>,
    /// `true` iff `redactions` is non-empty.
    pub has_pii: bool,
}

impl RedactionResult {
    fn unchanged(content: &str) -> Self {
        Self {
            redacted: content.to_owned(),
            ..Self::default()
        }
    }
}

/// Returns the catalog pattern names in application order.
pub fn available_patterns() -> Vec<&'static str> {
    PiiPattern::iter().map(|p| p.name()).collect()
}

/// Redacts PII from `content` according to `config`.
///
/// Each selected pattern runs against the output of the previous one:
/// matches are counted on the current text and then replaced. Never fails;
/// text without matches is returned unchanged.
pub fn redact_pii(content: &str, config: &RedactionConfig) -> RedactionResult {
    if !config.enabled {
        return RedactionResult::unchanged(content);
    }

    let mut redacted = content.to_owned();
    let mut redactions = Vec::new();
    let mut counts = HashMap::new();

    for pattern in config.selected() {
        let regex = pattern.regex();
        let count = regex.find_iter(&redacted).count();
        if count == 0 {
            continue;
        }

        counts.insert(pattern.name().to_owned(), count);
        redactions.push(format!("{}: {count} instance(s)", pattern.name()));
        redacted = regex
            .replace_all(&redacted, NoExpand(pattern.replacement()))
            .into_owned();
    }

    let has_pii = !redactions.is_empty();
    if has_pii && config.log_stats {
        tracing::info!(
            target: TRACING_TARGET,
            summary = %redactions.join(", "),
            "PII redaction"
        );
    }

    RedactionResult {
        redacted,
        redactions,
        counts,
        has_pii,
    }
}

/// Returns `true` if any selected pattern matches the original `content`.
///
/// An empty `patterns` slice checks the whole catalog.
pub fn contains_pii(content: &str, patterns: &[&str]) -> bool {
    let selected = if patterns.is_empty() {
        PiiPattern::iter().collect()
    } else {
        select(patterns)
    };

    selected.iter().any(|p| p.regex().is_match(content))
}

fn select<S: AsRef<str>>(names: &[S]) -> Vec<PiiPattern> {
    if names.is_empty() {
        return PiiPattern::iter().collect();
    }

    PiiPattern::iter()
        .filter(|p| names.iter().any(|n| n.as_ref() == p.name()))
        .collect()
}
