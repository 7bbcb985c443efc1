//! In-memory transcript store.
//!
//! Backs tests, and the console itself when persistence is turned off.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::StorageError;
use crate::models::{ChatSession, SessionConfig, SessionKey};
use crate::traits::TranscriptStore;

// The maps stay consistent even if a holder panicked, so poison is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory [`TranscriptStore`]. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranscriptStore {
    sessions: Arc<Mutex<HashMap<SessionKey, ChatSession>>>,
    config: Arc<Mutex<Option<SessionConfig>>>,
    /// Whether save should fail
    save_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure whether save should fail.
    pub fn set_save_should_fail(&self, should_fail: bool) {
        *lock(&self.save_should_fail) = should_fail;
    }

    pub fn session_count(&self) -> usize {
        lock(&self.sessions).len()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError> {
        if *lock(&self.save_should_fail) {
            return Err(StorageError::io(
                "memory",
                std::io::Error::new(std::io::ErrorKind::Other, "Mock save failure"),
            ));
        }
        lock(&self.sessions).insert(session.key(), session.clone());
        Ok(())
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<ChatSession>, StorageError> {
        Ok(lock(&self.sessions).get(key).cloned())
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), StorageError> {
        lock(&self.sessions).remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatSession>, StorageError> {
        let mut sessions: Vec<ChatSession> = lock(&self.sessions).values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);
        Ok(sessions)
    }

    async fn save_config(&self, config: &SessionConfig) -> Result<(), StorageError> {
        *lock(&self.config) = Some(config.clone());
        Ok(())
    }

    async fn load_config(&self) -> Result<Option<SessionConfig>, StorageError> {
        Ok(lock(&self.config).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(user: &str, id: &str) -> ChatSession {
        ChatSession {
            user_id: user.to_string(),
            session_id: id.to_string(),
            messages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = InMemoryTranscriptStore::new();
        let key = SessionKey::new("u", "s");
        assert!(store.load(&key).await.unwrap().is_none());

        store.save(&session("u", "s")).await.unwrap();
        store.save(&session("u", "s")).await.unwrap();
        assert_eq!(store.session_count(), 1);
        assert!(store.load(&key).await.unwrap().is_some());

        store.clear(&key).await.unwrap();
        assert!(store.load(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_failure() {
        let store = InMemoryTranscriptStore::new();
        store.set_save_should_fail(true);
        assert!(store.save(&session("u", "s")).await.is_err());
    }
}
