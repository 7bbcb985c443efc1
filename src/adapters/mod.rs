//! Concrete implementations of the ports in `crate::traits`.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileTranscriptStore`] - JSON files under the data directory
//!
//! The [`mock`] submodule provides test doubles for both.

pub mod file_store;
pub mod mock;
pub mod reqwest_http;

pub use file_store::FileTranscriptStore;
pub use mock::{InMemoryTranscriptStore, MockHttpClient};
pub use reqwest_http::ReqwestHttpClient;
