//! Frame reconciliation for Transcript

use crate::frames::{FullMessage, InboundFrame};
use crate::models::Message;

use super::Transcript;

/// What a single reconciliation touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub id: String,
    /// The frame named an id not seen before
    pub created: bool,
}

impl Transcript {
    /// Fold one frame into the transcript.
    ///
    /// Creates or updates exactly the message the frame names. Existing
    /// messages never move, and no other message changes.
    pub fn apply_frame(&mut self, frame: InboundFrame) -> Reconciled {
        let id = frame.id().to_string();

        if let Some(message) = self.get_mut(&id) {
            merge(message, frame);
            return Reconciled { id, created: false };
        }

        self.push(seed(frame));
        Reconciled { id, created: true }
    }

    /// Append a finished user turn and return its id.
    pub fn push_user_turn(&mut self, text: &str) -> String {
        let message = Message::user(text);
        let id = message.id.clone();
        self.push(message);
        id
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }
}

/// First frame for an id.
fn seed(frame: InboundFrame) -> Message {
    match frame {
        InboundFrame::Chunk { id, text_delta } => {
            let mut message = Message::assistant(id, true);
            message.append_text(&text_delta);
            message
        }
        InboundFrame::Complete { id } => Message::assistant(id, false),
        // Options ahead of any content still belong to a reply in progress.
        InboundFrame::Options { id, options } => {
            let mut message = Message::assistant(id, true);
            message.options = Some(options);
            message
        }
        InboundFrame::FullMessage(full) => {
            let mut message = Message::assistant(full.id.clone(), full.partial);
            replace_body(&mut message, full);
            message
        }
    }
}

/// Later frame for a known id.
fn merge(message: &mut Message, frame: InboundFrame) {
    match frame {
        InboundFrame::Chunk { text_delta, .. } => {
            message.append_text(&text_delta);
            message.streaming = true;
        }
        InboundFrame::Complete { .. } => message.streaming = false,
        InboundFrame::Options { options, .. } => message.options = Some(options),
        InboundFrame::FullMessage(full) => {
            // A completed message stays completed.
            message.streaming = message.streaming && full.partial;
            replace_body(message, full);
        }
    }
}

fn replace_body(message: &mut Message, full: FullMessage) {
    message.role = full.role;
    message.content = full.content;
    message.parts = full.parts;
    message.metadata = full.metadata;
    if let Some(timestamp) = full.timestamp {
        message.timestamp = timestamp;
    }
}

/// Pure form of [`Transcript::apply_frame`].
pub fn apply(mut transcript: Transcript, frame: InboundFrame) -> Transcript {
    transcript.apply_frame(frame);
    transcript
}

/// Pure form of [`Transcript::push_user_turn`].
pub fn append_user_turn(mut transcript: Transcript, text: &str) -> Transcript {
    transcript.push_user_turn(text);
    transcript
}

/// An empty transcript; whatever was passed in is dropped.
pub fn clear(_transcript: Transcript) -> Transcript {
    Transcript::new()
}
