//! Wire protocol definitions
//!
//! The protocol has no envelope: a client sends one fixed-width nickname
//! frame, then raw chat payloads. Each read on the socket is treated as one
//! message, so boundaries follow the transport's read segmentation.

use std::borrow::Cow;

use crate::error::AppError;
use crate::types::Nickname;

/// Width of the handshake frame in bytes
pub const NICKNAME_FRAME_LEN: usize = 32;

/// Largest chat payload read in one go
pub const MESSAGE_BUFFER_LEN: usize = 2048;

/// Payload that ends a session instead of being broadcast
pub const EXIT_COMMAND: &[u8] = b"exit";

/// Client → Server message, classified from one read
#[derive(Debug, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Chat payload to broadcast verbatim
    Chat(&'a [u8]),
    /// Voluntary departure
    Exit,
    /// Nothing meaningful (e.g. only NUL padding)
    Empty,
}

impl<'a> Inbound<'a> {
    /// Classify the bytes returned by a single read
    ///
    /// Bytes after the first NUL are ignored.
    pub fn classify(frame: &'a [u8]) -> Self {
        let end = frame.iter().position(|&b| b == 0).unwrap_or(frame.len());
        let payload = &frame[..end];
        if payload.is_empty() {
            return Inbound::Empty;
        }
        if strip_line_ending(payload) == EXIT_COMMAND {
            return Inbound::Exit;
        }
        Inbound::Chat(payload)
    }
}

/// Server-generated announcement
#[derive(Debug, Clone, Copy)]
pub enum Announcement<'a> {
    /// A client finished its handshake
    Joined(&'a Nickname),
    /// A registered client disconnected
    Left(&'a Nickname),
}

impl Announcement<'_> {
    /// Encode as the newline-terminated line sent to peers
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl std::fmt::Display for Announcement<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Announcement::Joined(nick) => writeln!(f, "{nick} joined"),
            Announcement::Left(nick) => writeln!(f, "{nick} left"),
        }
    }
}

/// Build a zero-padded handshake frame of `width` bytes
///
/// The nickname must leave room for at least one terminating NUL.
pub fn encode_handshake(nickname: &Nickname, width: usize) -> Result<Vec<u8>, AppError> {
    let bytes = nickname.as_str().as_bytes();
    if bytes.len() >= width {
        return Err(AppError::InvalidNickname(nickname.to_string()));
    }
    let mut frame = vec![0u8; width];
    frame[..bytes.len()].copy_from_slice(bytes);
    Ok(frame)
}

/// Append a newline unless the payload already ends with one
pub fn terminate_line(payload: &[u8]) -> Cow<'_, [u8]> {
    if payload.ends_with(b"\n") {
        Cow::Borrowed(payload)
    } else {
        let mut owned = Vec::with_capacity(payload.len() + 1);
        owned.extend_from_slice(payload);
        owned.push(b'\n');
        Cow::Owned(owned)
    }
}

fn strip_line_ending(payload: &[u8]) -> &[u8] {
    let payload = payload.strip_suffix(b"\n").unwrap_or(payload);
    payload.strip_suffix(b"\r").unwrap_or(payload)
}
