//! Debug event types and channel for the console's live trace.
//!
//! Backend exchanges, raw stream lines, transcript changes and stream
//! lifecycle transitions are broadcast on a tokio broadcast channel. The
//! console server forwards them to `/ws` subscribers.

mod events;
pub(crate) mod html;
mod server;

pub use events::*;
pub use server::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::{ApiCall, Message, SessionKey};

/// Type alias for the debug event sender.
pub type DebugEventSender = broadcast::Sender<DebugEvent>;

/// Create a new debug event channel with the specified capacity.
///
/// Returns both the sender and receiver. The sender can be cloned
/// to allow multiple producers, and the receiver can be resubscribed
/// to allow multiple consumers.
pub fn create_debug_channel(capacity: usize) -> (DebugEventSender, broadcast::Receiver<DebugEvent>) {
    broadcast::channel(capacity)
}

/// A debug event with the session it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugEvent {
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    /// The specific event data
    pub event: DebugEventKind,
}

impl DebugEvent {
    /// Create a new debug event with the current timestamp.
    pub fn new(event: DebugEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: None,
            session_id: None,
            event,
        }
    }

    /// Create a new debug event tagged with a session.
    pub fn with_session(event: DebugEventKind, key: &SessionKey) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: Some(key.user_id.clone()),
            session_id: Some(key.session_id.clone()),
            event,
        }
    }
}

/// The specific kind of debug event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebugEventKind {
    /// A request/response exchange with the backend
    ApiCall(ApiCall),
    /// Raw line received on a stream
    RawFrame(RawFrameData),
    /// A message created or updated
    TranscriptChange(TranscriptChangeData),
    /// Stream lifecycle transition
    StreamLifecycle(StreamLifecycleData),
    /// Error that occurred during processing
    Error(ErrorData),
}

/// Emits debug events for one session.
///
/// Sending never fails: with no subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct DebugTracer {
    tx: DebugEventSender,
    key: Option<SessionKey>,
}

impl DebugTracer {
    pub fn new(tx: DebugEventSender) -> Self {
        Self { tx, key: None }
    }

    pub fn for_session(tx: DebugEventSender, key: SessionKey) -> Self {
        Self { tx, key: Some(key) }
    }

    pub fn emit(&self, kind: DebugEventKind) {
        let event = match &self.key {
            Some(key) => DebugEvent::with_session(kind, key),
            None => DebugEvent::new(kind),
        };
        let _ = self.tx.send(event);
    }

    pub fn api_call(&self, call: &ApiCall) {
        self.emit(DebugEventKind::ApiCall(call.clone()));
    }

    pub fn raw_frame(&self, line: &str, frame_type: &str) {
        self.emit(DebugEventKind::RawFrame(RawFrameData::new(line, frame_type)));
    }

    pub fn transcript_change(&self, message: &Message, created: bool) {
        self.emit(DebugEventKind::TranscriptChange(TranscriptChangeData::new(
            &message.id,
            created,
            message.streaming,
            message.content.len(),
        )));
    }

    pub fn lifecycle(&self, phase: StreamPhase, details: Option<String>) {
        let data = match details {
            Some(details) => StreamLifecycleData::with_details(phase, details),
            None => StreamLifecycleData::new(phase),
        };
        self.emit(DebugEventKind::StreamLifecycle(data));
    }

    pub fn error(&self, source: ErrorSource, message: impl Into<String>) {
        self.emit(DebugEventKind::Error(ErrorData::new(source, message)));
    }
}
