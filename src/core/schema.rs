//! Typed shapes for the model's structured output.
//!
//! Providers return one JSON object per turn carrying the reply text and any
//! proposed file operations. This module owns the carriers and the
//! validation boundary between raw provider JSON and the rest of the crate.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Full content for a file to be written, overwriting any existing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToCreate {
    pub path: String,
    pub content: String,
}

/// A targeted substitution: `original_snippet` must occur exactly once in
/// the current file content for the edit to be unambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileToEdit {
    pub path: String,
    pub original_snippet: String,
    pub new_snippet: String,
}

/// The contract every provider adapter must produce after parsing raw model
/// output. `assistant_reply` is accepted as an alias for `message`; deployed
/// prompt/model pairs have emitted both names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantResponse {
    #[serde(alias = "assistant_reply")]
    pub message: String,
    #[serde(
        default,
        deserialize_with = "nullable_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub files_to_create: Vec<FileToCreate>,
    #[serde(
        default,
        deserialize_with = "nullable_vec",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub files_to_edit: Vec<FileToEdit>,
}

impl AssistantResponse {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            files_to_create: Vec::new(),
            files_to_edit: Vec::new(),
        }
    }

    pub fn has_file_operations(&self) -> bool {
        !self.files_to_create.is_empty() || !self.files_to_edit.is_empty()
    }
}

// Models occasionally emit `"files_to_create": null` for "none".
fn nullable_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let value = Option::<Vec<T>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("response payload is not a JSON object")]
    NotAnObject,
    #[error("malformed response payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("response contains a file operation with an empty path")]
    EmptyPath,
}

/// Validate a raw provider payload into a typed [`AssistantResponse`].
///
/// Enforces: `message` present (may be empty), file-operation lists default
/// to empty when absent or null, and every file path non-empty.
pub fn validate(raw: serde_json::Value) -> Result<AssistantResponse, SchemaError> {
    if !raw.is_object() {
        return Err(SchemaError::NotAnObject);
    }

    let response: AssistantResponse = serde_json::from_value(raw)?;

    if response.files_to_create.iter().any(|f| f.path.is_empty())
        || response.files_to_edit.iter().any(|f| f.path.is_empty())
    {
        return Err(SchemaError::EmptyPath);
    }

    Ok(response)
}

/// Pull the free-text reply out of a payload that failed full validation,
/// so a turn can still complete message-only.
pub fn salvage_message(raw: &serde_json::Value) -> Option<String> {
    raw.get("message")
        .or_else(|| raw.get("assistant_reply"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_response() -> AssistantResponse {
        AssistantResponse {
            message: "Created.".to_string(),
            files_to_create: vec![FileToCreate {
                path: "out.py".to_string(),
                content: "print(1)".to_string(),
            }],
            files_to_edit: vec![FileToEdit {
                path: "main.rs".to_string(),
                original_snippet: "let x = 1;".to_string(),
                new_snippet: "let x = 2;".to_string(),
            }],
        }
    }

    #[test]
    fn validate_round_trips_serialized_responses() {
        for response in [
            sample_response(),
            AssistantResponse::message_only("Nothing to do."),
            AssistantResponse::message_only(""),
        ] {
            let raw = serde_json::to_value(&response).unwrap();
            assert_eq!(validate(raw).unwrap(), response);
        }
    }

    #[test]
    fn missing_operation_lists_default_to_empty() {
        let response = validate(json!({"message": "hi"})).unwrap();
        assert!(response.files_to_create.is_empty());
        assert!(response.files_to_edit.is_empty());
        assert!(!response.has_file_operations());
    }

    #[test]
    fn null_operation_lists_are_treated_as_empty() {
        let response = validate(json!({
            "message": "hi",
            "files_to_create": null,
            "files_to_edit": null
        }))
        .unwrap();
        assert!(!response.has_file_operations());
    }

    #[test]
    fn assistant_reply_is_accepted_as_message_alias() {
        let response = validate(json!({"assistant_reply": "aliased"})).unwrap();
        assert_eq!(response.message, "aliased");
    }

    #[test]
    fn missing_message_is_rejected() {
        let err = validate(json!({"files_to_create": []})).unwrap_err();
        assert!(matches!(err, SchemaError::Payload(_)));
    }

    #[test]
    fn non_object_payloads_are_rejected() {
        assert!(matches!(
            validate(json!("just a string")),
            Err(SchemaError::NotAnObject)
        ));
        assert!(matches!(validate(json!(42)), Err(SchemaError::NotAnObject)));
    }

    #[test]
    fn empty_paths_are_rejected() {
        let err = validate(json!({
            "message": "bad",
            "files_to_create": [{"path": "", "content": "x"}]
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::EmptyPath));
    }

    #[test]
    fn salvage_recovers_reply_text_from_malformed_payloads() {
        let raw = json!({"message": "kept", "files_to_edit": "not-a-list"});
        assert!(validate(raw.clone()).is_err());
        assert_eq!(salvage_message(&raw).as_deref(), Some("kept"));

        let aliased = json!({"assistant_reply": "also kept", "files_to_create": 3});
        assert_eq!(salvage_message(&aliased).as_deref(), Some("also kept"));

        assert!(salvage_message(&json!({"files_to_create": []})).is_none());
    }
}
