//! parley - a chat debugging console for agent backends.
//!
//! The console relays user turns to an agent backend, folds the streamed
//! reply into a per-session transcript, and broadcasts every exchange on a
//! debug feed. This library exposes its modules for the binary and for
//! integration tests.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod debug;
pub mod error;
pub mod frames;
pub mod models;
pub mod relay;
pub mod server;
pub mod session;
pub mod traits;
pub mod transcript;
