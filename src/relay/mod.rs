//! Relay to the agent backend.
//!
//! Shapes console requests into the backend's `/run`, `/run_sse` and session
//! endpoints, and records every exchange as an [`ApiCall`] for the debug
//! trace.

mod request;
mod stream;

pub use request::{ChatTurn, NewMessage, RequestPart, RunRequest};
pub use stream::{frame_stream, FrameStream};

use std::time::Instant;
use thiserror::Error;

use crate::models::{ApiCall, ApiRequest, ApiResponse, DEFAULT_APP_NAME};
use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// Errors from a backend exchange.
///
/// Each variant that reached the network keeps the recorded call so the
/// console can still show what was sent.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request never got a response.
    #[error("{source}")]
    Transport {
        source: HttpError,
        call: Box<ApiCall>,
    },

    /// The backend refused a streaming request.
    #[error("HTTP {status}: {message}")]
    Backend {
        status: u16,
        message: String,
        call: Box<ApiCall>,
    },

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl RelayError {
    pub fn api_call(&self) -> Option<&ApiCall> {
        match self {
            RelayError::Transport { call, .. } | RelayError::Backend { call, .. } => Some(call),
            RelayError::Encode(_) => None,
        }
    }
}

/// A completed buffered exchange.
#[derive(Debug, Clone)]
pub struct RelayExchange {
    pub call: ApiCall,
    pub status: u16,
    pub body: String,
}

impl RelayExchange {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as JSON, or as a JSON string when it is not JSON.
    pub fn data(&self) -> serde_json::Value {
        serde_json::from_str(&self.body)
            .unwrap_or_else(|_| serde_json::Value::String(self.body.clone()))
    }

    /// `HTTP 502: Bad Gateway`, for error bodies.
    pub fn status_line(&self) -> String {
        let reason = crate::models::status_text(self.status);
        format!("HTTP {}: {}", self.status, reason)
    }
}

/// An open streaming exchange. The body has not been read yet.
pub struct RelayStream {
    pub call: ApiCall,
    pub content_type: Option<String>,
    pub bytes: ByteStream,
}

impl std::fmt::Debug for RelayStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayStream")
            .field("call", &self.call)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Client for the agent backend.
#[derive(Debug, Clone)]
pub struct RelayClient<C> {
    http: C,
    base_url: String,
    app_name: String,
    /// Bearer token sent with every request, if configured
    authorization: Option<String>,
}

impl<C: HttpClient> RelayClient<C> {
    pub fn new(http: C, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            authorization: None,
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.authorization = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    fn default_headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Accept".to_string(), "*/*".to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert(
            "User-Agent".to_string(),
            format!("parley/{}", env!("CARGO_PKG_VERSION")),
        );
        if let Some(token) = &self.authorization {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    /// Create (or reset) a session on the backend with an initial state.
    pub async fn create_session(
        &self,
        user_id: &str,
        session_id: &str,
        state: &serde_json::Value,
        app_name: Option<&str>,
    ) -> Result<RelayExchange, RelayError> {
        let url = format!(
            "{}/apps/{}/users/{}/sessions/{}",
            self.base_url,
            urlencoding::encode(app_name.unwrap_or(&self.app_name)),
            urlencoding::encode(user_id),
            urlencoding::encode(session_id),
        );
        let body = serde_json::to_string(state)?;
        self.post(url, body, self.default_headers()).await
    }

    /// Send one turn and wait for the whole reply.
    pub async fn run(&self, turn: &ChatTurn, app_name: Option<&str>) -> Result<RelayExchange, RelayError> {
        let url = format!("{}/run", self.base_url);
        let request = RunRequest::new(app_name.unwrap_or(&self.app_name), turn);
        let body = serde_json::to_string(&request)?;
        self.post(url, body, self.default_headers()).await
    }

    /// Send one turn and return the reply body as it arrives.
    pub async fn run_stream(
        &self,
        turn: &ChatTurn,
        app_name: Option<&str>,
    ) -> Result<RelayStream, RelayError> {
        let url = format!("{}/run_sse", self.base_url);
        let request = RunRequest::new(app_name.unwrap_or(&self.app_name), turn).streaming();
        let body = serde_json::to_string(&request)?;

        let mut headers = self.default_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        let call = ApiCall::new(ApiRequest::post(&url, headers.clone(), body.clone()));
        let started = Instant::now();
        tracing::debug!("POST {} (stream)", url);

        match self.http.post_stream(&url, &body, &headers).await {
            Ok(response) => {
                let content_type = response.content_type().map(str::to_string);
                let call = call.completed(
                    ApiResponse::new(response.status, response.headers, ""),
                    started.elapsed(),
                );
                Ok(RelayStream {
                    call,
                    content_type,
                    bytes: response.body,
                })
            }
            Err(HttpError::ServerError { status, message }) => {
                let call = call.completed(
                    ApiResponse::new(status, Headers::new(), message.clone()),
                    started.elapsed(),
                );
                Err(RelayError::Backend {
                    status,
                    message,
                    call: Box::new(call),
                })
            }
            Err(source) => {
                let call = call.failed(source.to_string(), started.elapsed());
                Err(RelayError::Transport {
                    source,
                    call: Box::new(call),
                })
            }
        }
    }

    async fn post(&self, url: String, body: String, headers: Headers) -> Result<RelayExchange, RelayError> {
        let call = ApiCall::new(ApiRequest::post(&url, headers.clone(), body.clone()));
        let started = Instant::now();
        tracing::debug!("POST {}", url);

        match self.http.post(&url, &body, &headers).await {
            Ok(response) => {
                let status = response.status;
                if !response.is_success() {
                    tracing::warn!("Backend returned {} for {}", status, url);
                }
                let text = response.text();
                let call = call.completed(
                    ApiResponse::new(status, response.headers, text.clone()),
                    started.elapsed(),
                );
                Ok(RelayExchange {
                    call,
                    status,
                    body: text,
                })
            }
            Err(source) => {
                tracing::error!("Request to {} failed: {}", url, source);
                let call = call.failed(source.to_string(), started.elapsed());
                Err(RelayError::Transport {
                    source,
                    call: Box::new(call),
                })
            }
        }
    }
}

/// The reply text of a buffered `/run` body: its `message` or `response`
/// field, else the raw body.
pub fn bot_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "response"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::traits::Response;
    use bytes::Bytes;

    fn client(mock: &MockHttpClient) -> RelayClient<MockHttpClient> {
        RelayClient::new(mock.clone(), "http://backend:8000/")
    }

    #[tokio::test]
    async fn test_run_request_shape() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/run",
            MockResponse::Success(Response::new(200, Bytes::from(r#"{"message":"Hi!"}"#))),
        );

        let exchange = client(&mock)
            .run(&ChatTurn::new("u_123", "s-1", "Hello"), None)
            .await
            .unwrap();
        assert!(exchange.is_success());
        assert_eq!(bot_message(&exchange.body), "Hi!");
        assert_eq!(exchange.call.status(), Some(200));
        assert!(exchange.call.duration.is_some());

        let requests = mock.get_requests();
        assert_eq!(requests[0].url, "http://backend:8000/run");
        assert_eq!(
            requests[0].json().unwrap(),
            serde_json::json!({
                "appName": "multi_tool_agent",
                "userId": "u_123",
                "sessionId": "s-1",
                "newMessage": {"role": "user", "parts": [{"text": "Hello"}]}
            })
        );
        assert_eq!(requests[0].headers["Content-Type"], "application/json");
        assert_eq!(requests[0].headers["Accept"], "*/*");
        assert!(requests[0].headers["User-Agent"].starts_with("parley/"));
    }

    #[tokio::test]
    async fn test_run_uses_request_app_name_and_auth() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(200, Bytes::from("{}"))));

        client(&mock)
            .with_auth("secret")
            .run(&ChatTurn::new("u", "s", "hi"), Some("travel_agent"))
            .await
            .unwrap();

        let request = &mock.get_requests()[0];
        assert_eq!(request.json().unwrap()["appName"], "travel_agent");
        assert_eq!(request.headers["Authorization"], "Bearer secret");
    }

    #[tokio::test]
    async fn test_run_non_2xx_is_an_exchange() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(
            404,
            Bytes::from(r#"{"detail":"Session not found"}"#),
        )));

        let exchange = client(&mock)
            .run(&ChatTurn::new("u", "s", "hi"), None)
            .await
            .unwrap();
        assert!(!exchange.is_success());
        assert_eq!(exchange.status_line(), "HTTP 404: Not Found");
        assert_eq!(exchange.data()["detail"], "Session not found");
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_call() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));

        let err = client(&mock)
            .run(&ChatTurn::new("u", "s", "hi"), None)
            .await
            .unwrap_err();
        let call = err.api_call().unwrap();
        assert!(call.error.as_deref().unwrap().contains("refused"));
        assert!(call.response.is_none());
    }

    #[tokio::test]
    async fn test_create_session_encodes_path() {
        let mock = MockHttpClient::new();
        mock.set_default_response(MockResponse::Success(Response::new(200, Bytes::from("{}"))));

        let state = serde_json::json!({"health_assessment_status": "not_started"});
        client(&mock)
            .create_session("user 1", "s/2", &state, None)
            .await
            .unwrap();

        let request = &mock.get_requests()[0];
        assert_eq!(
            request.url,
            "http://backend:8000/apps/multi_tool_agent/users/user%201/sessions/s%2F2"
        );
        assert_eq!(request.json().unwrap(), state);
    }

    #[tokio::test]
    async fn test_run_stream_headers_and_body() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/run_sse",
            MockResponse::Stream(vec![Bytes::from("data: {}\n")]),
        );

        let stream = client(&mock)
            .run_stream(&ChatTurn::new("u", "s", "hi"), None)
            .await
            .unwrap();
        assert_eq!(stream.content_type.as_deref(), Some("text/event-stream"));

        let request = &mock.get_requests()[0];
        assert_eq!(request.headers["Accept"], "text/event-stream");
        assert_eq!(request.json().unwrap()["streaming"], true);
    }

    #[tokio::test]
    async fn test_run_stream_backend_error() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://backend:8000/run_sse",
            MockResponse::Success(Response::new(500, Bytes::from("boom"))),
        );

        let err = client(&mock)
            .run_stream(&ChatTurn::new("u", "s", "hi"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Backend { status: 500, .. }));
        assert_eq!(err.to_string(), "HTTP 500: boom");
    }

    #[test]
    fn test_bot_message() {
        assert_eq!(bot_message(r#"{"message":"a"}"#), "a");
        assert_eq!(bot_message(r#"{"response":"b"}"#), "b");
        assert_eq!(bot_message(r#"{"other":1}"#), r#"{"other":1}"#);
        assert_eq!(bot_message("plain"), "plain");
    }
}
