//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, streaming POST)
//! - [`TranscriptStore`] - Transcript and session-config persistence

pub mod http;
pub mod storage;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response, StreamResponse};
pub use storage::{export_chat_history, export_session_config, TranscriptStore};
