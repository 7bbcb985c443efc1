//! Console configuration.
//!
//! Built from defaults, then the environment, then command-line overrides.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PARLEY_BACKEND_URL` | `http://localhost:8000` |
//! | `PARLEY_APP_NAME` | `multi_tool_agent` |
//! | `PARLEY_PORT` | `3000` |
//! | `PARLEY_DATA_DIR` | `~/.parley` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::cli::ServeOverrides;
use crate::error::StorageError;
use crate::models::DEFAULT_APP_NAME;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration for the console server.
///
/// # Example
///
/// ```ignore
/// use parley::config::ConsoleConfig;
///
/// let config = ConsoleConfig::from_env()
///     .with_port(0)
///     .with_persist(false);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleConfig {
    /// Agent backend base URL
    pub backend_url: String,
    /// App name sent when a request does not name one
    pub app_name: String,
    /// Port the console listens on (0 picks a free port)
    pub port: u16,
    /// Address the console binds to
    pub bind_ip: IpAddr,
    /// Where transcripts are stored; `None` means `~/.parley`
    pub data_dir: Option<PathBuf>,
    /// Write transcripts to disk
    pub persist: bool,
    /// Broadcast buffer for the debug feed
    pub debug_capacity: usize,
    /// Give up on a stream that sends nothing for this long
    pub stream_idle_timeout_secs: Option<u64>,
    /// Bearer token forwarded to the backend
    pub backend_token: Option<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            port: DEFAULT_PORT,
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            data_dir: None,
            persist: true,
            debug_capacity: 1000,
            stream_idle_timeout_secs: Some(300),
            backend_token: None,
        }
    }
}

impl ConsoleConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn with_stream_idle_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.stream_idle_timeout_secs = secs;
        self
    }

    pub fn with_backend_token(mut self, token: impl Into<String>) -> Self {
        self.backend_token = Some(token.into());
        self
    }

    /// Read `PARLEY_*` variables over the defaults.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("PARLEY_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Ok(app_name) = std::env::var("PARLEY_APP_NAME") {
            config.app_name = app_name;
        }
        if let Ok(port) = std::env::var("PARLEY_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PARLEY_PORT: {}", port),
            }
        }
        if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(token) = std::env::var("PARLEY_BACKEND_TOKEN") {
            config.backend_token = Some(token).filter(|t| !t.is_empty());
        }

        config
    }

    /// Apply command-line flags, which win over the environment.
    pub fn apply(mut self, overrides: ServeOverrides) -> Self {
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(url) = overrides.backend_url {
            self.backend_url = url;
        }
        if let Some(app_name) = overrides.app_name {
            self.app_name = app_name;
        }
        if let Some(dir) = overrides.data_dir {
            self.data_dir = Some(dir);
        }
        if overrides.no_persist {
            self.persist = false;
        }
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// The configured data directory, or `~/.parley`.
    pub fn resolved_data_dir(&self) -> Result<PathBuf, StorageError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::home_dir()
                .map(|home| home.join(".parley"))
                .ok_or(StorageError::NoDataDirectory),
        }
    }
}
