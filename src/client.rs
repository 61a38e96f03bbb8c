//! Client record definition
//!
//! Represents a registered client: its identity and the write side of its
//! transport.

use std::net::SocketAddr;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::OwnedWriteHalf;
use tracing::debug;

use crate::error::SendError;
use crate::types::{ClientId, Nickname};

/// Registered client information
///
/// Owns the write half of the client's transport. The record is moved into
/// the registry on registration and handed back to its handler on
/// unregistration, so exactly one owner can write to or close it.
pub struct ClientRecord<W = OwnedWriteHalf> {
    /// Unique identifier for this client
    pub id: ClientId,
    /// Nickname from the handshake
    pub nickname: Nickname,
    /// Remote address, for logging
    pub addr: SocketAddr,
    writer: W,
}

impl<W> ClientRecord<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a new record for a client that completed its handshake
    pub fn new(id: ClientId, nickname: Nickname, addr: SocketAddr, writer: W) -> Self {
        Self {
            id,
            nickname,
            addr,
            writer,
        }
    }

    /// Write the whole payload to this client
    ///
    /// Short writes are retried by `write_all` until the payload is out or
    /// the transport fails.
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), SendError> {
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Shut down the write side and drop the record
    pub async fn close(mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!("Shutdown of {} ({}) failed: {}", self.id, self.addr, e);
        }
    }
}

impl<W> std::fmt::Debug for ClientRecord<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientRecord")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}
