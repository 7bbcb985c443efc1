//! Live transcripts, one per `(userId, sessionId)`.
//!
//! A session has two locks. The turn lock is held for a whole exchange with
//! the backend and makes its holder the only writer. The transcript lock is
//! held only while a frame is applied or a copy is taken, so readers can
//! watch a reply fold in. Different sessions never contend.

mod driver;

pub use driver::{fold_stream, StreamOutcome};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::error::StorageError;
use crate::models::SessionKey;
use crate::traits::TranscriptStore;
use crate::transcript::Transcript;

/// A live session: its key, creation time and shared transcript.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub key: SessionKey,
    pub created_at: DateTime<Utc>,
    pub transcript: Arc<Mutex<Transcript>>,
    turn: Arc<Mutex<()>>,
}

impl SessionHandle {
    /// Wait until no other exchange is writing to this session.
    ///
    /// The guard is owned so it can move into a spawned stream task.
    pub async fn begin_turn(&self) -> OwnedMutexGuard<()> {
        self.turn.clone().lock_owned().await
    }
}

/// Maps session keys to live transcripts, loading from the store on first
/// access.
pub struct SessionRegistry {
    store: Arc<dyn TranscriptStore>,
    sessions: RwLock<HashMap<SessionKey, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// Get the live session for `key`, restoring it from the store if this
    /// is the first access. A store failure starts an empty transcript.
    pub async fn open(&self, key: &SessionKey) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(key) {
            return handle.clone();
        }

        let (transcript, created_at) = match self.store.load(key).await {
            Ok(Some(session)) => {
                tracing::debug!("Restored session {} ({} messages)", key, session.messages.len());
                let created_at = session.created_at;
                (Transcript::from_session(session), created_at)
            }
            Ok(None) => (Transcript::new(), Utc::now()),
            Err(e) => {
                tracing::warn!("Failed to load session {}: {}", key, e);
                (Transcript::new(), Utc::now())
            }
        };

        // Another task may have opened the same session while we loaded.
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| SessionHandle {
                key: key.clone(),
                created_at,
                transcript: Arc::new(Mutex::new(transcript)),
                turn: Arc::new(Mutex::new(())),
            })
            .clone()
    }

    /// Persist a transcript the caller already holds the lock for.
    pub async fn save(&self, handle: &SessionHandle, transcript: &Transcript) -> Result<(), StorageError> {
        let session = transcript.to_session(&handle.key, handle.created_at);
        self.store.save(&session).await.map_err(|e| {
            tracing::warn!("Failed to save session {}: {}", handle.key, e);
            e
        })
    }

    /// Empty the live transcript, drop it from the store and forget the
    /// session.
    ///
    /// Waits for an exchange in flight to finish first. Anyone still holding
    /// the handle sees an empty transcript.
    pub async fn clear(&self, key: &SessionKey) -> Result<(), StorageError> {
        let handle = self.open(key).await;
        let _turn = handle.begin_turn().await;
        handle.transcript.lock().await.clear();

        {
            let mut sessions = self.sessions.write().await;
            if sessions
                .get(key)
                .map_or(false, |live| Arc::ptr_eq(&live.transcript, &handle.transcript))
            {
                sessions.remove(key);
            }
        }

        self.store.clear(key).await
    }

    /// A copy of the current transcript.
    ///
    /// Reading a session that is not live loads it from the store without
    /// registering it.
    pub async fn snapshot(&self, key: &SessionKey) -> Transcript {
        let live = self.sessions.read().await.get(key).cloned();
        if let Some(handle) = live {
            let transcript = handle.transcript.lock().await;
            return transcript.clone();
        }

        match self.store.load(key).await {
            Ok(Some(session)) => Transcript::from_session(session),
            Ok(None) => Transcript::new(),
            Err(e) => {
                tracing::warn!("Failed to load session {}: {}", key, e);
                Transcript::new()
            }
        }
    }

    pub async fn sessions_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
