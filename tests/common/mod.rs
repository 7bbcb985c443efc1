//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let backend = wiremock::MockServer::start().await;
//! let console = TestConsole::start(&backend.uri()).await;
//! let response = reqwest::get(console.url("/state")).await?;
//! ```

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parley::adapters::InMemoryTranscriptStore;
use parley::config::ConsoleConfig;
use parley::debug::{create_debug_channel, DebugEvent};
use parley::models::SessionKey;
use parley::server::{start_server_on, AppState};
use parley::traits::TranscriptStore;
use parley::transcript::Transcript;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A console bound to a free local port, backed by an in-memory store.
pub struct TestConsole {
    pub addr: SocketAddr,
    pub store: InMemoryTranscriptStore,
    pub state: AppState,
    pub events: broadcast::Receiver<DebugEvent>,
    handle: JoinHandle<()>,
}

impl TestConsole {
    pub async fn start(backend_url: &str) -> Self {
        Self::start_with(ConsoleConfig::new().with_backend_url(backend_url)).await
    }

    pub async fn start_with(config: ConsoleConfig) -> Self {
        let store = InMemoryTranscriptStore::new();
        let (tx, events) = create_debug_channel(256);
        let state = AppState::new(config.with_port(0), Arc::new(store.clone()), tx);

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let (handle, addr) = start_server_on(addr, state.clone())
            .await
            .expect("Failed to start console");

        Self {
            addr,
            store,
            state,
            events,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn transcript(&self, user_id: &str, session_id: &str) -> Transcript {
        self.state
            .sessions
            .snapshot(&SessionKey::new(user_id, session_id))
            .await
    }

    /// Poll until no message in the session is streaming and the store
    /// caught up, or give up after a second.
    pub async fn wait_for_fold(&self, user_id: &str, session_id: &str, messages: usize) -> Transcript {
        for _ in 0..100 {
            let transcript = self.transcript(user_id, session_id).await;
            let saved = self
                .store
                .load(&SessionKey::new(user_id, session_id))
                .await
                .ok()
                .flatten()
                .map_or(0, |s| s.messages.len());
            if transcript.len() >= messages && !transcript.is_streaming() && saved >= messages {
                return transcript;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.transcript(user_id, session_id).await
    }

    /// Every debug event received so far.
    pub fn drain_events(&mut self) -> Vec<DebugEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for TestConsole {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Frame lines as a backend would stream them.
pub fn sse_body(frames: &[serde_json::Value]) -> String {
    frames
        .iter()
        .map(|frame| format!("data: {}\n\n", frame))
        .collect()
}
