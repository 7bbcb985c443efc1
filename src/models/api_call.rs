//! Recorded backend exchanges shown in the debug panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::traits::Headers;

/// The outgoing half of an exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub method: String,
    pub url: String,
    pub headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ApiRequest {
    pub fn post(url: impl Into<String>, headers: Headers, body: impl Into<String>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers,
            body: Some(body.into()),
            timestamp: Utc::now(),
        }
    }
}

/// The incoming half of an exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: Headers,
    /// Empty for streamed bodies, which are traced frame by frame instead
    pub body: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn new(status: u16, headers: Headers, body: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text(status),
            headers,
            body: body.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One request/response pair with timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApiCall {
    pub id: String,
    pub request: ApiRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ApiResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Milliseconds between sending the request and receiving the response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
}

impl ApiCall {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            request,
            response: None,
            error: None,
            duration: None,
        }
    }

    pub fn completed(mut self, response: ApiResponse, elapsed: Duration) -> Self {
        self.response = Some(response);
        self.duration = Some(elapsed.as_millis() as u64);
        self
    }

    pub fn failed(mut self, error: impl Into<String>, elapsed: Duration) -> Self {
        self.error = Some(error.into());
        self.duration = Some(elapsed.as_millis() as u64);
        self
    }

    pub fn status(&self) -> Option<u16> {
        self.response.as_ref().map(|r| r.status)
    }
}

/// Canonical reason phrase for a status code, empty when unknown.
pub fn status_text(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or_default()
        .to_string()
}
