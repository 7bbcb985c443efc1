//! Transcript read, clear and export.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde_json::{json, Value};

use super::{download, AppState};
use crate::debug::ErrorSource;
use crate::error::ConsoleError;
use crate::models::SessionKey;
use crate::traits::export_chat_history;

pub(super) async fn get_transcript_handler(
    State(state): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Response {
    let key = SessionKey::new(user_id, session_id);
    let transcript = state.sessions.snapshot(&key).await;
    Json(json!({
        "userId": key.user_id,
        "sessionId": key.session_id,
        "streaming": transcript.is_streaming(),
        "messages": transcript.messages(),
    }))
    .into_response()
}

pub(super) async fn clear_transcript_handler(
    State(state): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Response {
    let key = SessionKey::new(user_id, session_id);
    let result = state.sessions.clear(&key).await;

    let transcript = state.sessions.snapshot(&key).await;
    state.record(&key, &transcript).await;

    match result {
        Ok(()) => {
            tracing::info!("Cleared transcript {}", key);
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => {
            // The live transcript is already empty; only the stored copy survived
            state.tracer(&key).error(ErrorSource::Storage, e.to_string());
            ConsoleError::Storage(e).into_response()
        }
    }
}

/// Saved transcripts, newest first.
pub(super) async fn list_transcripts_handler(State(state): State<AppState>) -> Response {
    let mut sessions = match state.sessions.store().list().await {
        Ok(sessions) => sessions,
        Err(e) => return ConsoleError::Storage(e).into_response(),
    };
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let summaries: Vec<Value> = sessions
        .iter()
        .map(|session| {
            json!({
                "userId": session.user_id,
                "sessionId": session.session_id,
                "messages": session.messages.len(),
                "createdAt": session.created_at,
            })
        })
        .collect();
    Json(json!({ "sessions": summaries })).into_response()
}

/// Download the transcript as pretty JSON.
///
/// The live transcript is saved first so the download matches what the
/// console shows.
pub(super) async fn export_handler(
    State(state): State<AppState>,
    Path((user_id, session_id)): Path<(String, String)>,
) -> Response {
    let key = SessionKey::new(user_id, session_id);
    let handle = state.sessions.open(&key).await;
    {
        let transcript = handle.transcript.lock().await;
        if let Err(e) = state.sessions.save(&handle, &transcript).await {
            state.tracer(&key).error(ErrorSource::Storage, e.to_string());
            return ConsoleError::Storage(e).into_response();
        }
    }

    match export_chat_history(state.sessions.store().as_ref(), &key).await {
        Ok(body) => download(&export_filename(&key), body),
        Err(e) => ConsoleError::Storage(e).into_response(),
    }
}

fn export_filename(key: &SessionKey) -> String {
    let sanitize = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    };
    format!(
        "chat-history-{}-{}-{}.json",
        sanitize(&key.user_id),
        sanitize(&key.session_id),
        Utc::now().format("%Y-%m-%d")
    )
}
