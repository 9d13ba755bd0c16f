//! The fixed, ordered catalog of PII patterns.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// A named PII pattern from the redaction catalog.
///
/// Declaration order is the catalog order: redaction applies the patterns
/// in exactly this sequence, each one against the output of the previous
/// substitution, so reordering variants changes the output for overlapping
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PiiPattern {
    /// Email addresses.
    Email,
    /// North American phone numbers, e.g. `(555) 123-4567`, `+1 555 123 4567`.
    Phone,
    /// Social Security Numbers, e.g. `123-45-6789`.
    Ssn,
    /// Unseparated Visa, MasterCard, Amex and Discover numbers.
    CreditCard,
    /// Card numbers grouped in fours with dashes or spaces.
    CreditCardFormatted,
    /// IPv4 addresses.
    #[serde(rename = "ip_v4")]
    #[strum(serialize = "ip_v4")]
    IpV4,
    /// Full eight-group IPv6 addresses.
    #[serde(rename = "ip_v6")]
    #[strum(serialize = "ip_v6")]
    IpV6,
}

static PATTERNS: LazyLock<[Regex; PiiPattern::COUNT]> = LazyLock::new(|| {
    [
        r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}",
        r"(?:\+?1[-.\s]?)?\(?[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}",
        r"\b[0-9]{3}[-\s]?[0-9]{2}[-\s]?[0-9]{4}\b",
        r"\b(?:4[0-9]{12}(?:[0-9]{3})?|5[1-5][0-9]{14}|3[47][0-9]{13}|6(?:011|5[0-9][0-9])[0-9]{12})\b",
        r"\b(?:4[0-9]{3}|5[1-5][0-9]{2}|3[47][0-9]{2}|6(?:011|5[0-9]{2}))[-\s]?[0-9]{4}[-\s]?[0-9]{4}[-\s]?[0-9]{4}\b",
        r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b",
        r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b",
    ]
    .map(|pattern| Regex::new(pattern).expect("valid PII pattern"))
});

impl PiiPattern {
    /// Returns the compiled expression for this pattern.
    pub fn regex(&self) -> &'static Regex {
        &PATTERNS[*self as usize]
    }

    /// Returns the fixed token substituted for every match.
    pub const fn replacement(&self) -> &'static str {
        match self {
            Self::Email => "[EMAIL_REDACTED]",
            Self::Phone => "[PHONE_REDACTED]",
            Self::Ssn => "[SSN_REDACTED]",
            Self::CreditCard | Self::CreditCardFormatted => "[CC_REDACTED]",
            Self::IpV4 | Self::IpV6 => "[IP_REDACTED]",
        }
    }

    /// Returns the catalog name of this pattern.
    pub fn name(&self) -> &'static str {
        (*self).into()
    }
}
