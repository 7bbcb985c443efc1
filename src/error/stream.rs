//! Streaming-related error types.

use thiserror::Error;

use crate::traits::HttpError;

/// Terminal failure of a chunked frame stream.
///
/// Malformed frames are not errors at this level; they are skipped by the
/// decoder. A `StreamError` always ends the stream, and any message still
/// marked streaming is left that way.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    /// The transport failed before the backend finished sending.
    #[error("stream transport failed: {0}")]
    Transport(#[from] HttpError),

    /// The stream produced nothing for longer than the caller allows.
    #[error("stream stalled for {secs}s")]
    Stalled { secs: u64 },
}

impl StreamError {
    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Transport(_) => {
                "Connection to the agent backend was lost before the reply finished.".to_string()
            }
            StreamError::Stalled { secs } => {
                format!("The agent backend stopped sending data for {}s.", secs)
            }
        }
    }
}
