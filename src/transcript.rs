//! JSON contracts shared with the model-facing tooling.
//!
//! - [`TranscriptLine`]: one processed sample, `{token, GPT, GT}`, appended
//!   as a JSON line to a run log.
//! - [`FineTuneExample`]: one chat-formatted training example,
//!   `{messages: [{role, content}, ...]}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One processed sample in a run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    /// Sample token.
    pub token: String,
    /// Raw model answer.
    #[serde(rename = "GPT")]
    pub model_output: String,
    /// Ground-truth assistant message.
    #[serde(rename = "GT")]
    pub ground_truth: String,
}

/// Chat role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat-formatted fine-tuning example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuneExample {
    pub messages: Vec<ChatMessage>,
}

impl FineTuneExample {
    /// System, user and assistant turns in order.
    #[must_use]
    pub fn new(
        system: impl Into<String>,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> Self {
        Self {
            messages: vec![
                ChatMessage::new(Role::System, system),
                ChatMessage::new(Role::User, user),
                ChatMessage::new(Role::Assistant, assistant),
            ],
        }
    }

    /// Content of the first message with `role`, if any.
    #[must_use]
    pub fn content(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Serialize items as newline-delimited JSON.
///
/// # Errors
///
/// Returns [`crate::ReasoningError::Json`] if an item fails to serialize.
pub fn to_json_lines<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}

/// Parse newline-delimited JSON, skipping blank lines.
///
/// # Errors
///
/// Returns [`crate::ReasoningError::Json`] on the first malformed line.
pub fn from_json_lines<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line.trim()).map_err(Into::into))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_field_names() {
        let line = TranscriptLine {
            token: "tok".to_string(),
            model_output: "Trajectory:\n[]".to_string(),
            ground_truth: "[]".to_string(),
        };
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(
            json,
            r#"{"token":"tok","GPT":"Trajectory:\n[]","GT":"[]"}"#
        );
        let back: TranscriptLine = serde_json::from_str(&json).unwrap();
        assert_eq!(back, line);
    }

    #[test]
    fn test_finetune_example_shape() {
        let example = FineTuneExample::new("sys", "usr", "asst");
        let value = serde_json::to_value(&example).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][2]["content"], "asst");
        assert_eq!(example.content(Role::User), Some("usr"));
    }

    #[test]
    fn test_json_lines() {
        let items = vec![
            FineTuneExample::new("a", "b", "c"),
            FineTuneExample::new("d", "e", "f"),
        ];
        let text = to_json_lines(&items).unwrap();
        assert_eq!(text.lines().count(), 2);
        let back: Vec<FineTuneExample> = from_json_lines(&format!("{text}\n\n")).unwrap();
        assert_eq!(back, items);

        assert!(from_json_lines::<TranscriptLine>("{not json}").is_err());
    }
}
