//! Console HTTP server.
//!
//! Serves the console page, the `/api` routes that relay to the agent
//! backend, and the debug routes from [`crate::debug`].

mod chat;
mod session;
mod transcript;

pub use chat::ChatRequest;
pub use session::CreateSessionRequest;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

use crate::adapters::ReqwestHttpClient;
use crate::config::ConsoleConfig;
use crate::debug::{debug_router, DebugEventSender, DebugServerState, DebugTracer};
use crate::error::{ConsoleError, RelayError};
use crate::models::SessionKey;
use crate::relay::RelayClient;
use crate::session::SessionRegistry;
use crate::traits::TranscriptStore;
use crate::transcript::Transcript;

/// Shared state for every console route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConsoleConfig>,
    pub relay: Arc<RelayClient<ReqwestHttpClient>>,
    pub sessions: Arc<SessionRegistry>,
    pub debug: DebugServerState,
}

impl AppState {
    pub fn new(config: ConsoleConfig, store: Arc<dyn TranscriptStore>, event_tx: DebugEventSender) -> Self {
        let mut relay = RelayClient::new(ReqwestHttpClient::new(), &config.backend_url)
            .with_app_name(&config.app_name);
        if let Some(token) = &config.backend_token {
            relay = relay.with_auth(token);
        }

        Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
            sessions: Arc::new(SessionRegistry::new(store)),
            debug: DebugServerState::new(event_tx),
        }
    }

    pub(crate) fn tracer(&self, key: &SessionKey) -> DebugTracer {
        DebugTracer::for_session(self.debug.event_tx.clone(), key.clone())
    }

    /// Refresh the `/state` snapshot after a transcript changed.
    pub(crate) async fn record(&self, key: &SessionKey, transcript: &Transcript) {
        let sessions_count = self.sessions.sessions_count().await;
        self.debug
            .state_snapshot
            .write()
            .await
            .record_transcript(key, transcript, sessions_count);
    }
}

/// Build the console router with permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let debug = debug_router(state.debug.clone());

    Router::new()
        .route("/api/chat", post(chat::chat_handler))
        .route("/api/session", post(session::create_session_handler))
        .route(
            "/api/config",
            get(session::get_config_handler).put(session::put_config_handler),
        )
        .route("/api/config/export", get(session::export_config_handler))
        .route("/api/transcripts", get(transcript::list_transcripts_handler))
        .route(
            "/api/transcript/:user_id/:session_id",
            get(transcript::get_transcript_handler).delete(transcript::clear_transcript_handler),
        )
        .route(
            "/api/transcript/:user_id/:session_id/export",
            get(transcript::export_handler),
        )
        .with_state(state)
        .merge(debug)
        .layer(cors)
}

/// Start the console server on a specific address.
///
/// Port 0 picks a free port; the bound address is returned.
pub async fn start_server_on(
    addr: SocketAddr,
    state: AppState,
) -> color_eyre::Result<(JoinHandle<()>, SocketAddr)> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Console listening on http://{}", actual_addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Console server error: {}", e);
        }
    });

    Ok((handle, actual_addr))
}

/// A pretty JSON body served as a file download.
fn download(filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        let body = match &self {
            ConsoleError::Relay(relay) => relay_body(relay),
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status(self.status_code()), Json(body)).into_response()
    }
}

fn relay_body(err: &RelayError) -> serde_json::Value {
    json!({
        "success": false,
        "error": err.to_string(),
        "apiCall": err.api_call(),
    })
}
