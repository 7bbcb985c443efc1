//! File-backed transcript store.
//!
//! Layout under the data directory:
//! - `sessions.json` - array of every saved session, one entry per key
//! - `session_config.json` - the last saved session config

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StorageError;
use crate::models::{ChatSession, SessionConfig, SessionKey};
use crate::traits::TranscriptStore;

const SESSIONS_FILE: &str = "sessions.json";
const CONFIG_FILE: &str = "session_config.json";

/// [`TranscriptStore`] writing JSON files with `tokio::fs`.
///
/// Every write rewrites a whole file, so writers are serialized by an
/// internal lock. The data directory is created on first write.
#[derive(Debug)]
pub struct FileTranscriptStore {
    data_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTranscriptStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn sessions_path(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE)
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    /// Write through a temporary file so readers never see half a document.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StorageError::io(&self.data_dir, e))?;

        let json = serde_json::to_vec_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StorageError::io(path, e))
    }

    async fn read_sessions(&self) -> Result<Vec<ChatSession>, StorageError> {
        Ok(Self::read_json(&self.sessions_path()).await?.unwrap_or_default())
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read_sessions().await?;
        let key = session.key();
        match sessions.iter_mut().find(|s| s.key() == key) {
            Some(existing) => *existing = session.clone(),
            None => sessions.push(session.clone()),
        }
        self.write_json(&self.sessions_path(), &sessions).await?;
        tracing::debug!("Saved session {} ({} messages)", key, session.messages.len());
        Ok(())
    }

    async fn load(&self, key: &SessionKey) -> Result<Option<ChatSession>, StorageError> {
        let sessions = self.read_sessions().await?;
        Ok(sessions.into_iter().find(|s| &s.key() == key))
    }

    async fn clear(&self, key: &SessionKey) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read_sessions().await?;
        let before = sessions.len();
        sessions.retain(|s| &s.key() != key);
        if sessions.len() != before {
            self.write_json(&self.sessions_path(), &sessions).await?;
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ChatSession>, StorageError> {
        self.read_sessions().await
    }

    async fn save_config(&self, config: &SessionConfig) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        self.write_json(&self.config_path(), config).await
    }

    async fn load_config(&self) -> Result<Option<SessionConfig>, StorageError> {
        Self::read_json(&self.config_path()).await
    }
}
