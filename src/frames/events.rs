//! Frame type definitions.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{MessageMetadata, MessagePart, MessageRole};

/// Represents one line of a line-delimited frame transport.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameLine {
    /// Event type declaration (e.g., "event: message"). Frames carry their own type.
    Event(String),
    /// JSON payload, with any `data:` prefix removed
    Data(String),
    /// Empty line
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// A complete, non-streamed message delivered in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FullMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub parts: Vec<MessagePart>,
    pub metadata: MessageMetadata,
    /// Only set when the source supplied a timestamp
    pub timestamp: Option<DateTime<Utc>>,
    /// The backend marked this as an intermediate snapshot
    pub partial: bool,
}

/// The unit the transcript reconciler consumes.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Append `text_delta` to message `id`
    Chunk { id: String, text_delta: String },
    /// No more chunks for message `id`
    Complete { id: String },
    /// Selectable replies for message `id`
    Options { id: String, options: Vec<String> },
    /// Upsert a whole message
    FullMessage(FullMessage),
}

impl InboundFrame {
    /// The message id this frame refers to.
    pub fn id(&self) -> &str {
        match self {
            InboundFrame::Chunk { id, .. }
            | InboundFrame::Complete { id }
            | InboundFrame::Options { id, .. } => id,
            InboundFrame::FullMessage(message) => &message.id,
        }
    }

    /// Returns the wire type name as a string for debugging purposes.
    pub fn frame_type(&self) -> &'static str {
        match self {
            InboundFrame::Chunk { .. } => "chunk",
            InboundFrame::Complete { .. } => "complete",
            InboundFrame::Options { .. } => "options",
            InboundFrame::FullMessage(_) => "full_message",
        }
    }

    pub fn chunk(id: impl Into<String>, text_delta: impl Into<String>) -> Self {
        InboundFrame::Chunk {
            id: id.into(),
            text_delta: text_delta.into(),
        }
    }

    pub fn complete(id: impl Into<String>) -> Self {
        InboundFrame::Complete { id: id.into() }
    }

    pub fn options<I, S>(id: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        InboundFrame::Options {
            id: id.into(),
            options: options.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why one frame line could not be decoded.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameParseError {
    /// Invalid JSON in the payload
    #[error("invalid JSON in frame: {0}")]
    InvalidJson(String),
    /// A known frame type with a payload of the wrong shape
    #[error("invalid {frame_type} frame: {message}")]
    InvalidPayload {
        frame_type: &'static str,
        message: String,
    },
    /// No id in the frame and no fallback id to bind it to
    #[error("{frame_type} frame has no message id")]
    MissingId { frame_type: &'static str },
    /// A line grew past the decoder's limit before its newline arrived
    #[error("frame line longer than {limit} bytes")]
    LineTooLong { limit: usize },
}
