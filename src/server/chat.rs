//! `POST /api/chat`: forward one user turn and fold the reply.

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use futures::channel::mpsc;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;

use super::{status, AppState};
use crate::debug::{ErrorSource, StreamPhase};
use crate::error::{ConsoleError, StreamError};
use crate::frames::decode_reply;
use crate::models::SessionKey;
use crate::relay::{bot_message, frame_stream, ChatTurn};
use crate::session::{fold_stream, StreamOutcome};
use crate::traits::{ByteStream, HttpError};

const MISSING_FIELDS: &str = "Missing required fields: userId, sessionId, or message";

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub app_name: Option<String>,
    /// Relay `/run_sse` instead of `/run`
    #[serde(default)]
    pub stream: bool,
}

impl ChatRequest {
    /// The turn to forward, or `None` when a required field is missing or
    /// empty.
    pub fn turn(&self) -> Option<ChatTurn> {
        let field = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_string);
        Some(ChatTurn::new(
            field(&self.user_id)?,
            field(&self.session_id)?,
            field(&self.message)?,
        ))
    }

    fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref().filter(|name| !name.is_empty())
    }
}

pub(super) async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let Some(turn) = request.turn() else {
        return ConsoleError::InvalidRequest(MISSING_FIELDS.to_string()).into_response();
    };

    if request.stream {
        stream_chat(state, turn, request.app_name()).await
    } else {
        run_chat(state, turn, request.app_name()).await
    }
}

/// Buffered exchange: wait for the whole reply, fold it, answer with JSON.
async fn run_chat(state: AppState, turn: ChatTurn, app_name: Option<&str>) -> Response {
    let key = SessionKey::new(&turn.user_id, &turn.session_id);
    let tracer = state.tracer(&key);
    let handle = state.sessions.open(&key).await;
    let _turn = handle.begin_turn().await;

    {
        let mut transcript = handle.transcript.lock().await;
        let id = transcript.push_user_turn(&turn.message);
        if let Some(message) = transcript.get(&id) {
            tracer.transcript_change(message, true);
        }
    }

    let exchange = match state.relay.run(&turn, app_name).await {
        Ok(exchange) => exchange,
        Err(e) => {
            if let Some(call) = e.api_call() {
                tracer.api_call(call);
            }
            tracer.error(ErrorSource::Relay, e.to_string());
            persist(&state, &handle).await;
            return ConsoleError::Relay(e).into_response();
        }
    };
    tracer.api_call(&exchange.call);

    if !exchange.is_success() {
        tracer.error(ErrorSource::Relay, exchange.status_line());
        persist(&state, &handle).await;
        return (
            status(exchange.status),
            Json(json!({
                "success": false,
                "error": exchange.status_line(),
                "apiCall": exchange.call,
            })),
        )
            .into_response();
    }

    // Frames without an id bind to one fresh assistant message
    let fallback_id = uuid::Uuid::new_v4().to_string();
    let messages = {
        let mut transcript = handle.transcript.lock().await;
        for frame in decode_reply(&exchange.body, Some(&fallback_id)) {
            let reconciled = transcript.apply_frame(frame);
            if let Some(message) = transcript.get(&reconciled.id) {
                tracer.transcript_change(message, reconciled.created);
            }
        }
        let _ = state.sessions.save(&handle, &transcript).await;
        state.record(&key, &transcript).await;
        transcript.messages().to_vec()
    };

    Json(json!({
        "success": true,
        "data": exchange.data(),
        "botMessage": bot_message(&exchange.body),
        "messages": messages,
        "apiCall": exchange.call,
    }))
    .into_response()
}

/// Streamed exchange: relay the backend body unmodified while a background
/// task folds a copy of every chunk into the transcript.
///
/// The fold task drives the backend read, so the transcript keeps up even if
/// the browser goes away.
async fn stream_chat(state: AppState, turn: ChatTurn, app_name: Option<&str>) -> Response {
    let key = SessionKey::new(&turn.user_id, &turn.session_id);
    let tracer = state.tracer(&key);
    let handle = state.sessions.open(&key).await;
    let turn_guard = handle.begin_turn().await;

    {
        let mut transcript = handle.transcript.lock().await;
        let id = transcript.push_user_turn(&turn.message);
        if let Some(message) = transcript.get(&id) {
            tracer.transcript_change(message, true);
        }
    }

    tracer.lifecycle(StreamPhase::Connecting, None);
    let relayed = match state.relay.run_stream(&turn, app_name).await {
        Ok(relayed) => relayed,
        Err(e) => {
            if let Some(call) = e.api_call() {
                tracer.api_call(call);
            }
            tracer.lifecycle(StreamPhase::Failed, Some(e.to_string()));
            persist(&state, &handle).await;
            return ConsoleError::Relay(e).into_response();
        }
    };
    tracer.api_call(&relayed.call);
    tracer.lifecycle(StreamPhase::Connected, relayed.content_type.clone());

    let content_type = relayed
        .content_type
        .unwrap_or_else(|| "text/event-stream".to_string());

    let (body_tx, body_rx) = mpsc::unbounded::<Result<bytes::Bytes, HttpError>>();
    let abort_tx = body_tx.clone();
    let tee: ByteStream = Box::pin(relayed.bytes.inspect(move |chunk| {
        // A closed receiver only means the browser left
        let _ = body_tx.unbounded_send(chunk.clone());
    }));

    let idle_timeout = state.config.stream_idle_timeout_secs.map(Duration::from_secs);
    let fallback_id = uuid::Uuid::new_v4().to_string();
    let frames = frame_stream(tee, Some(fallback_id), idle_timeout, Some(tracer.clone()));

    tokio::spawn(async move {
        let _turn = turn_guard;
        let outcome = fold_stream(&handle.transcript, frames, Some(&tracer)).await;
        tracing::debug!("Stream for {} finished: {:?}", key, outcome.phase());

        // Transport errors already reached the caller through the tee; a
        // stall produced no item, so end the relayed body with one.
        if let StreamOutcome::Failed {
            error: error @ StreamError::Stalled { .. },
            ..
        } = &outcome
        {
            let _ = abort_tx.unbounded_send(Err(HttpError::Timeout(error.to_string())));
        }
        drop(abort_tx);

        let transcript = handle.transcript.lock().await;
        let _ = state.sessions.save(&handle, &transcript).await;
        state.record(&key, &transcript).await;
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        Body::from_stream(body_rx),
    )
        .into_response()
}

/// Save after a failed exchange so the user turn is kept.
async fn persist(state: &AppState, handle: &crate::session::SessionHandle) {
    let transcript = handle.transcript.lock().await;
    let _ = state.sessions.save(handle, &transcript).await;
    state.record(&handle.key, &transcript).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: serde_json::Value) -> ChatRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_turn_requires_every_field() {
        let full = request(json!({"userId": "u", "sessionId": "s", "message": "hi"}));
        assert_eq!(full.turn(), Some(ChatTurn::new("u", "s", "hi")));
        assert!(!full.stream);

        assert!(request(json!({"userId": "u", "sessionId": "s"})).turn().is_none());
        assert!(request(json!({"userId": "", "sessionId": "s", "message": "hi"}))
            .turn()
            .is_none());
    }

    #[test]
    fn test_empty_app_name_means_default() {
        let req = request(json!({"userId": "u", "sessionId": "s", "message": "hi", "appName": ""}));
        assert_eq!(req.app_name(), None);

        let req = request(json!({"userId": "u", "sessionId": "s", "message": "hi", "appName": "x", "stream": true}));
        assert_eq!(req.app_name(), Some("x"));
        assert!(req.stream);
    }
}
