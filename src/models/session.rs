use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Message;

/// App name used when neither the request nor the configuration names one.
pub const DEFAULT_APP_NAME: &str = "multi_tool_agent";

/// Identifies one conversation on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

/// A persisted transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl ChatSession {
    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.user_id, &self.session_id)
    }
}

/// A downloadable copy of one transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatExport {
    pub user_id: String,
    pub session_id: String,
    pub messages: Vec<Message>,
    pub exported_at: DateTime<Utc>,
}

impl ChatExport {
    pub fn new(session: ChatSession, exported_at: DateTime<Utc>) -> Self {
        Self {
            user_id: session.user_id,
            session_id: session.session_id,
            messages: session.messages,
            exported_at,
        }
    }
}

/// The parameters a session is created with on the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub user_id: String,
    pub session_id: String,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// Initial session state sent to the backend
    #[serde(default)]
    pub state: serde_json::Value,
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

impl SessionConfig {
    /// The starter config offered when nothing has been saved yet.
    pub fn template(app_name: &str) -> Self {
        Self {
            user_id: "u_123".to_string(),
            session_id: uuid::Uuid::new_v4().to_string(),
            app_name: app_name.to_string(),
            state: serde_json::json!({
                "health_assessment_status": "not_started",
                "hipaa_accepted": "",
                "health_assessment": "",
                "last_assesment_question": "",
                "health_interests": ""
            }),
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.user_id, &self.session_id)
    }
}
