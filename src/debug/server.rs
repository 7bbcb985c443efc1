//! Debug routes: console page, live event feed and state snapshot.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, RwLock};

use super::events::StateSnapshot;
use super::html::CONSOLE_HTML;
use super::DebugEventSender;

/// Shared state for the debug routes.
#[derive(Clone)]
pub struct DebugServerState {
    /// Broadcast sender for subscribing to events
    pub event_tx: DebugEventSender,
    /// Cached state snapshot
    pub state_snapshot: Arc<RwLock<StateSnapshot>>,
}

impl DebugServerState {
    pub fn new(event_tx: DebugEventSender) -> Self {
        Self {
            event_tx,
            state_snapshot: Arc::new(RwLock::new(StateSnapshot::default())),
        }
    }
}

/// Routes for `/`, `/ws` and `/state`, ready to merge into the console app.
pub fn debug_router(state: DebugServerState) -> Router {
    Router::new()
        .route("/", get(console_handler))
        .route("/ws", get(websocket_handler))
        .route("/state", get(state_handler))
        .with_state(state)
}

/// Handler for the console HTML page.
async fn console_handler() -> impl IntoResponse {
    Html(CONSOLE_HTML)
}

/// Handler for WebSocket connections.
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<DebugServerState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Forward every debug event to one WebSocket client until it leaves.
async fn handle_websocket(socket: WebSocket, state: DebugServerState) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_tx.subscribe();

    let send_task = tokio::spawn(async move {
        loop {
            match event_rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sender.send(Message::Text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to serialize debug event: {}", e);
                    }
                },
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("WebSocket client lagged, missed {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    send_task.abort();
}

/// Handler for the state endpoint.
async fn state_handler(State(state): State<DebugServerState>) -> impl IntoResponse {
    let snapshot = state.state_snapshot.read().await;
    Json(snapshot.clone())
}
