//! Ordered, id-indexed message transcript
//!
//! A [`Transcript`] owns the messages of one session in arrival order, plus an
//! index from message id to position. Every inbound frame touches exactly
//! one message, found through the index. See `reconcile` for the merge rules.

mod reconcile;

pub use reconcile::{append_user_turn, apply, clear, Reconciled};

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::models::{ChatSession, Message, MessageRole, SessionKey};

/// Messages of one session, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
    /// Message id -> position in `messages`
    index: HashMap<String, usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript from stored messages.
    ///
    /// A repeated id keeps the position of its first occurrence and the
    /// content of its last, so ids stay unique.
    pub fn from_messages(messages: impl IntoIterator<Item = Message>) -> Self {
        let mut transcript = Self::new();
        for message in messages {
            match transcript.index.get(&message.id) {
                Some(&pos) => transcript.messages[pos] = message,
                None => transcript.push(message),
            }
        }
        transcript
    }

    pub fn from_session(session: ChatSession) -> Self {
        Self::from_messages(session.messages)
    }

    /// Snapshot the transcript as a persistable session.
    pub fn to_session(&self, key: &SessionKey, created_at: DateTime<Utc>) -> ChatSession {
        ChatSession {
            user_id: key.user_id.clone(),
            session_id: key.session_id.clone(),
            messages: self.messages.clone(),
            created_at,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.index.get(id).map(|&pos| &self.messages[pos])
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any message still expects chunks.
    pub fn is_streaming(&self) -> bool {
        self.messages.iter().any(|m| m.streaming)
    }

    /// Ids of messages still marked streaming, in order.
    pub fn streaming_ids(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter(|m| m.streaming)
            .map(|m| m.id.clone())
            .collect()
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    fn push(&mut self, message: Message) {
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut Message> {
        let pos = *self.index.get(id)?;
        self.messages.get_mut(pos)
    }
}
