//! Backend session creation and the saved session config.

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{download, status, AppState};
use crate::debug::ErrorSource;
use crate::error::ConsoleError;
use crate::models::SessionConfig;
use crate::traits::export_session_config;

const MISSING_FIELDS: &str = "Missing required fields: userId, sessionId, or state";
const INVALID_STATE: &str = "Invalid JSON in initial state";
const NO_SAVED_CONFIG: &str = "No session config saved";

/// Body of `POST /api/session`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// An object, or the JSON text of one as typed into the console
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub app_name: Option<String>,
}

impl CreateSessionRequest {
    /// Validate into a config, parsing a string `state` as JSON.
    pub fn into_config(self, default_app_name: &str) -> Result<SessionConfig, ConsoleError> {
        let missing = || ConsoleError::InvalidRequest(MISSING_FIELDS.to_string());
        let user_id = self.user_id.filter(|v| !v.is_empty()).ok_or_else(missing)?;
        let session_id = self.session_id.filter(|v| !v.is_empty()).ok_or_else(missing)?;

        let state = match self.state {
            None | Some(Value::Null) => return Err(missing()),
            Some(Value::String(text)) if text.trim().is_empty() => return Err(missing()),
            Some(Value::String(text)) => serde_json::from_str(&text)
                .map_err(|_| ConsoleError::InvalidRequest(INVALID_STATE.to_string()))?,
            Some(value) => value,
        };

        Ok(SessionConfig {
            user_id,
            session_id,
            app_name: self
                .app_name
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default_app_name.to_string()),
            state,
        })
    }
}

pub(super) async fn create_session_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    let config = match request.into_config(state.relay.app_name()) {
        Ok(config) => config,
        Err(e) => return e.into_response(),
    };
    let key = config.key();
    let tracer = state.tracer(&key);

    // Remembered even if the backend refuses, so the console can retry
    if let Err(e) = state.sessions.store().save_config(&config).await {
        tracing::warn!("Failed to save session config: {}", e);
        tracer.error(ErrorSource::Storage, e.to_string());
    }

    let exchange = match state
        .relay
        .create_session(&config.user_id, &config.session_id, &config.state, Some(&config.app_name))
        .await
    {
        Ok(exchange) => exchange,
        Err(e) => {
            if let Some(call) = e.api_call() {
                tracer.api_call(call);
            }
            tracer.error(ErrorSource::Relay, e.to_string());
            return ConsoleError::Relay(e).into_response();
        }
    };
    tracer.api_call(&exchange.call);

    if !exchange.is_success() {
        tracer.error(ErrorSource::Relay, exchange.status_line());
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

    tracing::info!("Created backend session {}", key);
    Json(json!({
        "success": true,
        "data": exchange.data(),
        "apiCall": exchange.call,
    }))
    .into_response()
}

/// The saved config, or a fresh template.
pub(super) async fn get_config_handler(State(state): State<AppState>) -> Response {
    let saved = match state.sessions.store().load_config().await {
        Ok(saved) => saved,
        Err(e) => {
            tracing::warn!("Failed to load session config: {}", e);
            None
        }
    };
    Json(saved.unwrap_or_else(|| SessionConfig::template(state.relay.app_name()))).into_response()
}

/// Download the saved config as pretty JSON.
pub(super) async fn export_config_handler(State(state): State<AppState>) -> Response {
    match export_session_config(state.sessions.store().as_ref()).await {
        Ok(body) if body.is_empty() => ConsoleError::NotFound(NO_SAVED_CONFIG.to_string()).into_response(),
        Ok(body) => download("session-config.json", body),
        Err(e) => ConsoleError::Storage(e).into_response(),
    }
}

pub(super) async fn put_config_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    let config = match request.into_config(state.relay.app_name()) {
        Ok(config) => config,
        Err(e) => return e.into_response(),
    };

    match state.sessions.store().save_config(&config).await {
        Ok(()) => Json(json!({ "success": true, "config": config })).into_response(),
        Err(e) => {
            state.tracer(&config.key()).error(ErrorSource::Storage, e.to_string());
            ConsoleError::Storage(e).into_response()
        }
    }
}
