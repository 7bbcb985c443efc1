//! Transcript persistence port.
//!
//! Storage is a convenience cache, not a source of truth: callers log
//! failures and carry on with the in-memory transcript.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::models::{ChatExport, ChatSession, SessionConfig, SessionKey};

/// Trait for saving and restoring transcripts and the session config.
///
/// Implementations include the file-backed store in `adapters` and the
/// in-memory store in `adapters::mock`.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Insert or replace the session with the same key.
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError>;

    /// Load one session, `Ok(None)` if it was never saved.
    async fn load(&self, key: &SessionKey) -> Result<Option<ChatSession>, StorageError>;

    /// Remove one session. Clearing an unknown key is not an error.
    async fn clear(&self, key: &SessionKey) -> Result<(), StorageError>;

    /// Every saved session.
    async fn list(&self) -> Result<Vec<ChatSession>, StorageError>;

    /// Remember the last session config the user created a session with.
    async fn save_config(&self, config: &SessionConfig) -> Result<(), StorageError>;

    async fn load_config(&self) -> Result<Option<SessionConfig>, StorageError>;
}

/// Pretty JSON of one saved session stamped with the export time, empty
/// when there is none.
pub async fn export_chat_history(
    store: &dyn TranscriptStore,
    key: &SessionKey,
) -> Result<String, StorageError> {
    match store.load(key).await? {
        Some(session) => Ok(serde_json::to_string_pretty(&ChatExport::new(session, Utc::now()))?),
        None => Ok(String::new()),
    }
}

/// Pretty JSON of the saved session config, empty when there is none.
pub async fn export_session_config(store: &dyn TranscriptStore) -> Result<String, StorageError> {
    match store.load_config().await? {
        Some(config) => Ok(serde_json::to_string_pretty(&config)?),
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::InMemoryTranscriptStore;
    use crate::models::Message;

    #[tokio::test]
    async fn test_export_chat_history_empty_when_missing() {
        let store = InMemoryTranscriptStore::new();
        let out = export_chat_history(&store, &SessionKey::new("u", "s"))
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_export_chat_history_pretty_json() {
        let store = InMemoryTranscriptStore::new();
        let session = ChatSession {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            messages: vec![Message::user("hello")],
            created_at: Utc::now(),
        };
        store.save(&session).await.unwrap();

        let out = export_chat_history(&store, &session.key()).await.unwrap();
        assert!(out.contains('\n'));
        let parsed: ChatExport = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.user_id, "u");
        assert_eq!(parsed.messages[0].content, "hello");
        assert!(parsed.exported_at >= session.created_at);
        assert!(out.contains("\"exportedAt\""));
    }

    #[tokio::test]
    async fn test_export_session_config() {
        let store = InMemoryTranscriptStore::new();
        assert!(export_session_config(&store).await.unwrap().is_empty());

        store
            .save_config(&SessionConfig::template("multi_tool_agent"))
            .await
            .unwrap();
        let out = export_session_config(&store).await.unwrap();
        assert!(out.contains("\"userId\": \"u_123\""));
    }
}
