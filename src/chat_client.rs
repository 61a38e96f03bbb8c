//! Client-side connector
//!
//! Opens a TCP connection, sends the handshake frame and exchanges
//! newline-terminated lines with the relay.

use std::net::SocketAddr;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::AppError;
use crate::message::{encode_handshake, NICKNAME_FRAME_LEN};
use crate::types::Nickname;

/// A connected chat client
#[derive(Debug)]
pub struct ChatClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl ChatClient {
    /// Connect to `addr` and announce `nickname`
    pub async fn connect(addr: SocketAddr, nickname: &Nickname) -> Result<Self, AppError> {
        let frame = encode_handshake(nickname, NICKNAME_FRAME_LEN)?;
        let stream = TcpStream::connect(addr).await?;
        let (reader, mut writer) = stream.into_split();
        writer.write_all(&frame).await?;
        debug!("Connected to {} as {}", addr, nickname);

        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send raw bytes as one message
    pub async fn send(&mut self, payload: &[u8]) -> Result<(), AppError> {
        self.writer.write_all(payload).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive the next line without its terminator
    ///
    /// Returns `None` once the server closes the connection.
    pub async fn recv_line(&mut self) -> Result<Option<String>, AppError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Split into independently owned receive and send halves
    pub fn into_split(self) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf) {
        (self.reader, self.writer)
    }
}
