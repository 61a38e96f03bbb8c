//! Error types for the chat relay
//!
//! Defines connection-level errors and per-recipient send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Every variant is scoped to a single connection attempt except
/// `InvalidConfig` and listener `Io` failures at startup.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on a socket or the listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry has no free slot
    #[error("Server is full ({0} clients)")]
    CapacityExceeded(usize),

    /// Nickname frame was too short or contained control characters
    #[error("Invalid nickname: {0:?}")]
    InvalidNickname(String),

    /// Peer closed the connection before sending a nickname
    #[error("Connection closed during handshake")]
    HandshakeClosed,

    /// Server configuration rejected at startup
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Message send errors
///
/// Occurs when a write to one recipient's transport fails.
#[derive(Debug, Error)]
pub enum SendError {
    /// The underlying write or flush failed
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}
