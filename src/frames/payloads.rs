//! Wire payload deserialization structs.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::events::{FrameParseError, FullMessage};
use crate::models::{
    deserialize_opt_id, text_of_parts, CustomMetadata, EventActions, FunctionCall,
    FunctionResponse, MessageMetadata, MessagePart, MessageRole, UsageMetadata,
};

/// `{"type":"chunk",...}`. The delta may arrive under several names.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChunkPayload {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default, alias = "text", alias = "delta")]
    pub content: Option<String>,
}

/// `{"type":"complete",...}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompletePayload {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
}

/// `{"type":"options",...}`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OptionsPayload {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

/// One part of a backend content object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PartPayload {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub function_call: Option<FunctionCall>,
    #[serde(default)]
    pub function_response: Option<FunctionResponse>,
}

impl PartPayload {
    fn into_parts(self) -> impl Iterator<Item = MessagePart> {
        let text = self.text.filter(|t| !t.is_empty()).map(MessagePart::text);
        let call = self.function_call.map(MessagePart::FunctionCall);
        let response = self.function_response.map(MessagePart::FunctionResponse);
        text.into_iter().chain(call).chain(response)
    }
}

/// `content` is a plain string in simple replies and `{role, parts}` in
/// agent-runtime events.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentPayload {
    Text(String),
    Structured {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        parts: Vec<PartPayload>,
    },
}

/// A message-shaped object: an agent-runtime event or a stored message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MessagePayload {
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<ContentPayload>,
    #[serde(default)]
    pub parts: Option<Vec<PartPayload>>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub invocation_id: Option<String>,
    #[serde(default)]
    pub actions: Option<EventActions>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    pub custom_metadata: Option<CustomMetadata>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub partial: bool,
}

impl MessagePayload {
    /// Whether a JSON object looks like a message rather than a control frame.
    pub fn is_message_shaped(value: &serde_json::Value) -> bool {
        value.get("content").is_some() || value.get("parts").is_some()
    }

    pub fn into_full_message(
        self,
        fallback_id: Option<&str>,
    ) -> Result<FullMessage, FrameParseError> {
        let id = self
            .id
            .or_else(|| fallback_id.map(str::to_string))
            .ok_or(FrameParseError::MissingId {
                frame_type: "full_message",
            })?;

        let mut role = self.role;
        let parts: Vec<MessagePart> = match self.content {
            Some(ContentPayload::Text(text)) if text.is_empty() => Vec::new(),
            Some(ContentPayload::Text(text)) => vec![MessagePart::text(text)],
            Some(ContentPayload::Structured {
                role: content_role,
                parts,
            }) => {
                role = role.or(content_role);
                parts.into_iter().flat_map(PartPayload::into_parts).collect()
            }
            None => self
                .parts
                .unwrap_or_default()
                .into_iter()
                .flat_map(PartPayload::into_parts)
                .collect(),
        };

        Ok(FullMessage {
            id,
            role: role
                .as_deref()
                .map(MessageRole::from_backend)
                .unwrap_or_default(),
            content: text_of_parts(&parts),
            parts,
            metadata: MessageMetadata {
                author: self.author,
                invocation_id: self.invocation_id,
                usage: self.usage_metadata,
                custom_metadata: self.custom_metadata,
                actions: self.actions,
            },
            timestamp: self.timestamp.and_then(timestamp_from_epoch),
            partial: self.partial,
        })
    }
}

/// Backends send either fractional seconds or milliseconds since epoch.
/// Anything past 1e11 cannot be seconds (year 5138) and is read as millis.
fn timestamp_from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let millis = if value > 1e11 { value } else { value * 1000.0 };
    DateTime::from_timestamp_millis(millis as i64)
}
