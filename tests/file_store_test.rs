//! Integration tests for the file-backed transcript store.

use chrono::{DateTime, Utc};
use parley::adapters::FileTranscriptStore;
use parley::models::{ChatSession, Message, SessionConfig, SessionKey};
use parley::traits::{export_chat_history, TranscriptStore};
use tempfile::TempDir;

fn session(user_id: &str, session_id: &str, texts: &[&str], created_ms: i64) -> ChatSession {
    ChatSession {
        user_id: user_id.to_string(),
        session_id: session_id.to_string(),
        messages: texts.iter().map(|t| Message::user(*t)).collect(),
        created_at: DateTime::from_timestamp_millis(created_ms).unwrap_or_else(Utc::now),
    }
}

#[tokio::test]
async fn test_creates_data_dir_on_first_save() {
    let temp = TempDir::new().unwrap();
    let data_dir = temp.path().join("nested").join(".parley");
    let store = FileTranscriptStore::new(&data_dir);

    store.save(&session("u", "s", &["hi"], 1_700_000_000_000)).await.unwrap();

    assert!(data_dir.join("sessions.json").exists());
    let raw = std::fs::read_to_string(data_dir.join("sessions.json")).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[0]["userId"], "u");
    assert_eq!(parsed[0]["createdAt"], 1_700_000_000_000_i64);
}

#[tokio::test]
async fn test_save_upserts_by_key() {
    let temp = TempDir::new().unwrap();
    let store = FileTranscriptStore::new(temp.path());

    store.save(&session("u", "a", &["one"], 1_000)).await.unwrap();
    store.save(&session("u", "b", &["two"], 2_000)).await.unwrap();
    store.save(&session("u", "a", &["one", "three"], 1_000)).await.unwrap();

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 2);

    let a = store.load(&SessionKey::new("u", "a")).await.unwrap().unwrap();
    assert_eq!(a.messages.len(), 2);
    assert_eq!(a.messages[1].content, "three");
}

#[tokio::test]
async fn test_survives_reopen() {
    let temp = TempDir::new().unwrap();
    let original = session("u", "s", &["persisted"], 5_000);
    FileTranscriptStore::new(temp.path()).save(&original).await.unwrap();

    let reopened = FileTranscriptStore::new(temp.path());
    let loaded = reopened.load(&original.key()).await.unwrap().unwrap();
    assert_eq!(loaded, original);
}

#[tokio::test]
async fn test_clear_removes_one_session() {
    let temp = TempDir::new().unwrap();
    let store = FileTranscriptStore::new(temp.path());
    store.save(&session("u", "a", &["x"], 1)).await.unwrap();
    store.save(&session("u", "b", &["y"], 2)).await.unwrap();

    store.clear(&SessionKey::new("u", "a")).await.unwrap();
    // Clearing an unknown key is not an error
    store.clear(&SessionKey::new("nobody", "none")).await.unwrap();

    assert!(store.load(&SessionKey::new("u", "a")).await.unwrap().is_none());
    assert!(store.load(&SessionKey::new("u", "b")).await.unwrap().is_some());
}

#[tokio::test]
async fn test_session_config_round_trip() {
    let temp = TempDir::new().unwrap();
    let store = FileTranscriptStore::new(temp.path());
    assert!(store.load_config().await.unwrap().is_none());

    let config = SessionConfig::template("multi_tool_agent");
    store.save_config(&config).await.unwrap();
    assert!(temp.path().join("session_config.json").exists());
    assert_eq!(store.load_config().await.unwrap(), Some(config));
}

#[tokio::test]
async fn test_export_chat_history_from_disk() {
    let temp = TempDir::new().unwrap();
    let store = FileTranscriptStore::new(temp.path());
    let saved = session("u", "s", &["exported"], 9_000);
    store.save(&saved).await.unwrap();

    let json = export_chat_history(&store, &saved.key()).await.unwrap();
    assert!(json.contains("\"exported\""));
    assert!(json.lines().count() > 1);
}

#[tokio::test]
async fn test_unwritable_dir_is_an_error() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("file");
    std::fs::write(&blocker, "not a directory").unwrap();

    let store = FileTranscriptStore::new(blocker.join("data"));
    let err = store.save(&session("u", "s", &["x"], 1)).await.unwrap_err();
    assert!(matches!(err, parley::error::StorageError::Io { .. }));
}
