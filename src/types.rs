//! Basic type definitions for the chat relay
//!
//! Provides newtype wrappers for type safety:
//! - `ClientId`: process-unique, monotonically assigned client identifier
//! - `Nickname`: validated display name announced during handshake

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::AppError;

/// Unique client identifier (newtype pattern)
///
/// Assigned at accept time by a `ClientIdAllocator`. Ids are never reused
/// while the process runs, even after the client's slot is freed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing client ids
#[derive(Debug)]
pub struct ClientIdAllocator {
    next: AtomicU64,
}

impl ClientIdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id
    pub fn next_id(&self) -> ClientId {
        ClientId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ClientIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Client nickname
///
/// At least `MIN_LEN` characters, no control characters, no surrounding
/// whitespace. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Nickname(String);

impl Nickname {
    /// Minimum number of characters
    pub const MIN_LEN: usize = 2;

    /// Validate a nickname typed by a user
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < Self::MIN_LEN || trimmed.chars().any(char::is_control) {
            return Err(AppError::InvalidNickname(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Extract the nickname from a raw handshake frame
    ///
    /// The frame is cut at the first NUL, `\n` or `\r`; anything after that
    /// is padding. Invalid UTF-8 is replaced rather than rejected.
    pub fn from_frame(frame: &[u8]) -> Result<Self, AppError> {
        let end = frame
            .iter()
            .position(|b| matches!(b, b'\0' | b'\n' | b'\r'))
            .unwrap_or(frame.len());
        Self::parse(&String::from_utf8_lossy(&frame[..end]))
    }

    /// Borrow the nickname text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Nickname {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
