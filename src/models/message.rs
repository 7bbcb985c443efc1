use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    #[default]
    Assistant,
}

impl MessageRole {
    /// Map a backend role name onto a transcript role.
    ///
    /// Agent runtimes call the assistant side `model`; anything that is not
    /// explicitly `user` is rendered as the assistant.
    pub fn from_backend(role: &str) -> Self {
        if role.eq_ignore_ascii_case("user") {
            MessageRole::User
        } else {
            MessageRole::Assistant
        }
    }

    pub fn is_user(self) -> bool {
        self == MessageRole::User
    }
}

/// A tool invocation requested by the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// The result of a tool invocation, fed back into the agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub response: serde_json::Value,
}

/// One fragment of a message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MessagePart {
    Text { text: String },
    FunctionCall(FunctionCall),
    FunctionResponse(FunctionResponse),
}

impl MessagePart {
    pub fn text(text: impl Into<String>) -> Self {
        MessagePart::Text { text: text.into() }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Concatenate the text fragments of a part list.
pub fn text_of_parts(parts: &[MessagePart]) -> String {
    parts.iter().filter_map(MessagePart::as_text).collect()
}

/// Token counts for one modality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ModalityTokenCount {
    pub modality: String,
    #[serde(default)]
    pub token_count: u64,
}

/// Model usage counters reported with a reply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompt_tokens_details: Vec<ModalityTokenCount>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates_tokens_details: Vec<ModalityTokenCount>,
}

/// Vendor metadata attached by tracing or provider integrations.
///
/// Field names are kept in the snake_case the backends emit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CustomMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opik_usage: Option<serde_json::Value>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// Side effects an agent turn declared.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_delta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_delta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_to_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_auth_configs: Option<serde_json::Value>,
}

/// Provenance carried for display. Never consulted by reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_metadata: Option<CustomMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<EventActions>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self == &MessageMetadata::default()
    }

    /// The state delta declared by this turn, if any.
    pub fn state_delta(&self) -> Option<&serde_json::Value> {
        self.actions.as_ref().and_then(|a| a.state_delta.as_ref())
    }
}

/// One turn in a conversation transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Reconciliation key, unique within a transcript
    pub id: String,
    pub role: MessageRole,
    /// Concatenation of every text fragment seen for this id
    pub content: String,
    /// Milliseconds since epoch on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// True while more chunks for this id are expected
    #[serde(default)]
    pub streaming: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<MessagePart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "MessageMetadata::is_empty")]
    pub metadata: MessageMetadata,
}

impl Message {
    /// A finished user turn with a fresh id.
    pub fn user(text: impl Into<String>) -> Self {
        let text = text.into();
        let parts = if text.is_empty() {
            Vec::new()
        } else {
            vec![MessagePart::text(text.clone())]
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: MessageRole::User,
            content: text,
            timestamp: Utc::now(),
            streaming: false,
            parts,
            options: None,
            metadata: MessageMetadata::default(),
        }
    }

    /// An empty assistant message.
    pub fn assistant(id: impl Into<String>, streaming: bool) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            streaming,
            parts: Vec::new(),
            options: None,
            metadata: MessageMetadata::default(),
        }
    }

    /// Append a text delta to the content and to the trailing text part.
    pub fn append_text(&mut self, delta: &str) {
        if delta.is_empty() {
            return;
        }
        self.content.push_str(delta);
        if let Some(MessagePart::Text { text }) = self.parts.last_mut() {
            text.push_str(delta);
        } else {
            self.parts.push(MessagePart::text(delta));
        }
    }

    pub fn function_calls(&self) -> impl Iterator<Item = &FunctionCall> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::FunctionCall(call) => Some(call),
            _ => None,
        })
    }

    pub fn function_responses(&self) -> impl Iterator<Item = &FunctionResponse> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::FunctionResponse(resp) => Some(resp),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_backend() {
        assert_eq!(MessageRole::from_backend("user"), MessageRole::User);
        assert_eq!(MessageRole::from_backend("model"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_backend("assistant"), MessageRole::Assistant);
    }

    #[test]
    fn test_user_message_has_fresh_id() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, MessageRole::User);
        assert!(!a.streaming);
        assert_eq!(a.parts, vec![MessagePart::text("hi")]);
    }

    #[test]
    fn test_append_text_extends_trailing_text_part() {
        let mut msg = Message::assistant("m1", true);
        msg.append_text("He");
        msg.append_text("llo");
        assert_eq!(msg.content, "Hello");
        assert_eq!(msg.parts, vec![MessagePart::text("Hello")]);
    }

    #[test]
    fn test_append_text_after_function_call_starts_new_part() {
        let mut msg = Message::assistant("m1", true);
        msg.append_text("Looking up. ");
        msg.parts.push(MessagePart::FunctionCall(FunctionCall {
            id: Some("c1".to_string()),
            name: "get_weather".to_string(),
            args: serde_json::json!({"city": "Oslo"}),
        }));
        msg.append_text("Done.");

        assert_eq!(msg.parts.len(), 3);
        assert_eq!(msg.content, "Looking up. Done.");
        assert_eq!(text_of_parts(&msg.parts), "Looking up. Done.");
        assert_eq!(msg.function_calls().count(), 1);
    }

    #[test]
    fn test_append_empty_text_is_noop() {
        let mut msg = Message::assistant("m1", true);
        msg.append_text("");
        assert!(msg.content.is_empty());
        assert!(msg.parts.is_empty());
    }

    #[test]
    fn test_message_serializes_camel_case_with_millis() {
        let mut msg = Message::assistant("m1", false);
        msg.timestamp = DateTime::from_timestamp_millis(1_700_000_000_123).unwrap();
        msg.metadata.invocation_id = Some("inv-1".to_string());

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["timestamp"], 1_700_000_000_123i64);
        assert_eq!(json["metadata"]["invocationId"], "inv-1");
        assert!(json.get("options").is_none());

        let back: Message = serde_json::from_value(json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_metadata_is_empty() {
        assert!(MessageMetadata::default().is_empty());
        let meta = MessageMetadata {
            author: Some("root_agent".to_string()),
            ..Default::default()
        };
        assert!(!meta.is_empty());
    }
}
