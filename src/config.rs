//! Server configuration
//!
//! Listener address, capacity and frame widths.

use std::net::SocketAddr;

use crate::error::AppError;
use crate::message::{MESSAGE_BUFFER_LEN, NICKNAME_FRAME_LEN};

/// Default number of concurrent clients
pub const DEFAULT_MAX_CLIENTS: usize = 100;

/// Server configuration structure
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port; 0 picks an ephemeral port
    pub port: u16,
    /// Registry capacity
    pub max_clients: usize,
    /// Handshake frame width
    pub nickname_len: usize,
    /// Chat read buffer size
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 0,
            max_clients: DEFAULT_MAX_CLIENTS,
            nickname_len: NICKNAME_FRAME_LEN,
            buffer_size: MESSAGE_BUFFER_LEN,
        }
    }
}

impl ServerConfig {
    /// Default configuration listening on `port`
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Self::default()
        }
    }

    /// Resolve `host:port` into a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::InvalidConfig(format!("bad address {}: {e}", self.host)))
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_clients == 0 {
            return Err(AppError::InvalidConfig("max_clients must be at least 1".into()));
        }
        if self.nickname_len < 2 {
            return Err(AppError::InvalidConfig("nickname_len must be at least 2".into()));
        }
        if self.buffer_size == 0 {
            return Err(AppError::InvalidConfig("buffer_size must be positive".into()));
        }
        self.bind_addr().map(|_| ())
    }
}
