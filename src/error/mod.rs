//! Error types for parley.
//!
//! Each concern owns a `thiserror` enum:
//!
//! | Type | Raised by |
//! |------|-----------|
//! | [`FrameParseError`] | one undecodable frame line (skipped, never fatal) |
//! | [`StreamError`] | terminal failure of a chunked transport |
//! | [`StorageError`] | the persistence port |
//! | [`RelayError`] | a backend exchange |
//! | [`HttpError`] | the HTTP client port |
//!
//! [`ConsoleError`] gathers them for the console server, which turns them
//! into JSON error bodies.

mod storage;
mod stream;

pub use storage::StorageError;
pub use stream::StreamError;

pub use crate::frames::FrameParseError;
pub use crate::relay::RelayError;
pub use crate::traits::HttpError;

use thiserror::Error;

/// Unified error for console operations.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The caller sent something the console cannot act on.
    #[error("{0}")]
    InvalidRequest(String),

    /// Nothing saved under the requested name.
    #[error("{0}")]
    NotFound(String),
}

impl ConsoleError {
    /// HTTP status the console answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ConsoleError::InvalidRequest(_) => 400,
            ConsoleError::NotFound(_) => 404,
            ConsoleError::Relay(RelayError::Backend { status, .. }) => *status,
            _ => 500,
        }
    }
}
