//! Prompt record returned by the fetch endpoint.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length of a prompt key, in characters.
pub const MAX_KEY_LENGTH: usize = 256;

/// A versioned prompt fetched from ForPrompt.
///
/// Field names on the wire are camelCase (`versionNumber`, `systemPrompt`,
/// ...). The nine descriptive fields are optional and stay `None` when the
/// service omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    /// Unique identifier for the prompt.
    pub key: String,
    /// Display name of the prompt.
    pub name: String,
    /// Version number of this prompt, starting at 1.
    pub version_number: u32,
    /// The system prompt body.
    pub system_prompt: String,
    /// Last update time in Unix milliseconds.
    pub updated_at: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Primary goal of the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// How the prompt should behave.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_behavior: Option<String>,
    /// Expected input structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_format: Option<String>,
    /// Expected output structure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    /// Limitations and rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    /// Primary use cases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_cases: Option<String>,
    /// Free-form documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
    /// Notes about tool usage strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools_notes: Option<String>,
}

impl Prompt {
    /// Decodes a prompt from a fetch response body.
    ///
    /// A body missing any required field, or with a zero version number,
    /// is reported as an [`ErrorKind::ApiError`](crate::ErrorKind::ApiError).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let prompt: Self = serde_json::from_value(value).map_err(|e| {
            Error::api_error(format!("Invalid prompt response: {e}"), 0).with_source(e)
        })?;

        if prompt.version_number == 0 {
            return Err(Error::api_error(
                "Invalid prompt response: versionNumber must be positive",
                0,
            ));
        }

        Ok(prompt)
    }

    /// Returns the last update time as a timestamp, if it is in range.
    pub fn updated_at_timestamp(&self) -> Option<Timestamp> {
        Timestamp::from_millisecond(self.updated_at).ok()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    fn minimal() -> serde_json::Value {
        json!({
            "key": "greeting",
            "name": "Greeting",
            "versionNumber": 3,
            "systemPrompt": "You are friendly.",
            "updatedAt": 1_700_000_000_000_i64,
        })
    }

    #[test]
    fn test_decode_required_fields() {
        let prompt = Prompt::from_value(minimal()).unwrap();
        assert_eq!(prompt.key, "greeting");
        assert_eq!(prompt.name, "Greeting");
        assert_eq!(prompt.version_number, 3);
        assert_eq!(prompt.system_prompt, "You are friendly.");
        assert_eq!(prompt.updated_at, 1_700_000_000_000);
        assert!(prompt.description.is_none());
        assert!(prompt.tools_notes.is_none());
    }

    #[test]
    fn test_decode_optional_fields() {
        let mut body = minimal();
        body["description"] = json!("Says hello");
        body["expectedBehavior"] = json!("Be warm");
        body["useCases"] = json!("Onboarding");
        body["toolsNotes"] = json!("No tools");

        let prompt = Prompt::from_value(body).unwrap();
        assert_eq!(prompt.description.as_deref(), Some("Says hello"));
        assert_eq!(prompt.expected_behavior.as_deref(), Some("Be warm"));
        assert_eq!(prompt.use_cases.as_deref(), Some("Onboarding"));
        assert_eq!(prompt.tools_notes.as_deref(), Some("No tools"));
        assert!(prompt.purpose.is_none());
    }

    #[test]
    fn test_decode_missing_required_field() {
        let mut body = minimal();
        body.as_object_mut().unwrap().remove("systemPrompt");

        let error = Prompt::from_value(body).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ApiError);
        assert!(error.message.contains("systemPrompt"));
    }

    #[test]
    fn test_decode_zero_version() {
        let mut body = minimal();
        body["versionNumber"] = json!(0);

        let error = Prompt::from_value(body).unwrap_err();
        assert_eq!(error.kind, ErrorKind::ApiError);
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let prompt = Prompt::from_value(minimal()).unwrap();
        let value = serde_json::to_value(&prompt).unwrap();
        assert_eq!(value["versionNumber"], 3);
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_updated_at_timestamp() {
        let prompt = Prompt::from_value(minimal()).unwrap();
        let timestamp = prompt.updated_at_timestamp().unwrap();
        assert_eq!(timestamp.as_millisecond(), 1_700_000_000_000);
    }
}
