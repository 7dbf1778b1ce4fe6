//! Client connection settings

use cellar_core::DEFAULT_PORT;
use std::time::Duration;

/// How calls map onto TCP connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionMode {
    /// Dial, exchange one request/response, close
    #[default]
    PerCall,
    /// Keep one framed connection open and reuse it across calls
    Persistent,
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address (`host:port`)
    pub server_addr: String,

    /// Upper bound for establishing the TCP connection
    pub connect_timeout: Duration,

    /// Upper bound for writing the request and reading the response
    pub io_timeout: Duration,

    pub mode: ConnectionMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            connect_timeout: Duration::from_secs(5),
            io_timeout: Duration::from_secs(10),
            mode: ConnectionMode::PerCall,
        }
    }
}

impl ClientConfig {
    /// Create with custom server address
    pub fn with_addr(server_addr: impl Into<String>) -> Self {
        Self {
            server_addr: server_addr.into(),
            ..Default::default()
        }
    }

    /// Set both timeouts
    pub fn with_timeouts(mut self, connect: Duration, io: Duration) -> Self {
        self.connect_timeout = connect;
        self.io_timeout = io;
        self
    }

    pub fn with_mode(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self
    }
}
