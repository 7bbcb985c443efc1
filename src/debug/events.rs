//! Debug event data types.
//!
//! This module contains the data structures for various debug event types
//! that are broadcast via the debug channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{SessionKey, UsageMetadata};
use crate::transcript::Transcript;

/// One raw line received from the backend stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFrameData {
    /// The line as received, prefix included
    pub line: String,
    /// Decoded frame type, or `ignored` / `malformed`
    pub frame_type: String,
}

impl RawFrameData {
    pub fn new(line: impl Into<String>, frame_type: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            frame_type: frame_type.into(),
        }
    }
}

/// A message created or updated by reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptChangeData {
    pub message_id: String,
    /// The frame named an id not seen before
    pub created: bool,
    /// Streaming flag after the change
    pub streaming: bool,
    /// Content length in bytes after the change
    pub content_len: usize,
}

impl TranscriptChangeData {
    pub fn new(message_id: impl Into<String>, created: bool, streaming: bool, content_len: usize) -> Self {
        Self {
            message_id: message_id.into(),
            created,
            streaming,
            content_len,
        }
    }
}

/// Stream lifecycle event data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamLifecycleData {
    /// The lifecycle phase
    pub phase: StreamPhase,
    /// Additional details about the phase
    pub details: Option<String>,
}

impl StreamLifecycleData {
    /// Create a new stream lifecycle event.
    pub fn new(phase: StreamPhase) -> Self {
        Self {
            phase,
            details: None,
        }
    }

    /// Create a new stream lifecycle event with details.
    pub fn with_details(phase: StreamPhase, details: impl Into<String>) -> Self {
        Self {
            phase,
            details: Some(details.into()),
        }
    }
}

/// Phases of a stream's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamPhase {
    /// Request sent to the backend
    Connecting,
    /// Backend accepted and started sending
    Connected,
    /// Every message in the stream reached `complete`
    Completed,
    /// Source ended with messages still streaming
    Ended,
    /// Transport failed mid-stream
    Failed,
}

/// Error data for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorData {
    /// Source of the error
    pub source: ErrorSource,
    /// Error message
    pub message: String,
}

impl ErrorData {
    /// Create a new error event.
    pub fn new(source: ErrorSource, message: impl Into<String>) -> Self {
        Self {
            source,
            message: message.into(),
        }
    }
}

/// Source of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorSource {
    /// A frame line that could not be decoded
    FrameParsing,
    /// The backend connection
    Transport,
    /// A backend exchange that returned an error
    Relay,
    /// The persistence port
    Storage,
}

/// Snapshot of the console state for the debug dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Number of sessions with a live transcript
    pub sessions_count: usize,
    /// Messages in the most recently touched transcript
    pub messages_count: usize,
    /// Whether that transcript has a message still streaming
    pub is_streaming: bool,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// Author of the last assistant message
    pub last_author: Option<String>,
    pub last_invocation_id: Option<String>,
    pub last_usage: Option<UsageMetadata>,
    pub last_state_delta: Option<serde_json::Value>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StateSnapshot {
    /// Refresh from the transcript that just changed.
    pub fn record_transcript(&mut self, key: &SessionKey, transcript: &Transcript, sessions_count: usize) {
        self.sessions_count = sessions_count;
        self.messages_count = transcript.len();
        self.is_streaming = transcript.is_streaming();
        self.user_id = Some(key.user_id.clone());
        self.session_id = Some(key.session_id.clone());

        let metadata = transcript.last_assistant().map(|m| &m.metadata);
        self.last_author = metadata.and_then(|m| m.author.clone());
        self.last_invocation_id = metadata.and_then(|m| m.invocation_id.clone());
        self.last_usage = metadata.and_then(|m| m.usage.clone());
        // The latest delta may sit on an earlier event of the same turn.
        self.last_state_delta = transcript
            .messages()
            .iter()
            .rev()
            .find_map(|m| m.metadata.state_delta().cloned());
        self.updated_at = Some(Utc::now());
    }
}
