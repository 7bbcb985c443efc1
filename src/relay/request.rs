//! Request bodies sent to the agent backend.

use serde::{Deserialize, Serialize};

/// One user turn to forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub user_id: String,
    pub session_id: String,
    pub message: String,
}

impl ChatTurn {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            message: message.into(),
        }
    }
}

/// A text part of the outgoing message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestPart {
    pub text: String,
}

/// The user message in backend shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMessage {
    pub role: String,
    pub parts: Vec<RequestPart>,
}

/// Body of `POST /run` and `POST /run_sse`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    pub new_message: NewMessage,
    /// Only set for `/run_sse`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
}

impl RunRequest {
    pub fn new(app_name: &str, turn: &ChatTurn) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_id: turn.user_id.clone(),
            session_id: turn.session_id.clone(),
            new_message: NewMessage {
                role: "user".to_string(),
                parts: vec![RequestPart {
                    text: turn.message.clone(),
                }],
            },
            streaming: None,
        }
    }

    pub fn streaming(mut self) -> Self {
        self.streaming = Some(true);
        self
    }
}
