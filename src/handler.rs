//! TCP connection handler
//!
//! Drives one client through its lifecycle:
//! `Accepted → AwaitingHandshake → Active → Disconnecting → Terminated`.
//! The handler owns both halves of the transport; the write half is lent to
//! the registry while the client is registered and taken back on teardown.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::broadcast::Broadcaster;
use crate::client::ClientRecord;
use crate::config::ServerConfig;
use crate::error::AppError;
use crate::message::{terminate_line, Announcement, Inbound};
use crate::registry::Registry;
use crate::types::{ClientId, Nickname};

/// Shared state handed to every connection handler
pub struct ServerContext<W = tokio::net::tcp::OwnedWriteHalf> {
    pub broadcaster: Broadcaster<W>,
    pub config: Arc<ServerConfig>,
}

impl<W> Clone for ServerContext<W> {
    fn clone(&self) -> Self {
        Self {
            broadcaster: self.broadcaster.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<W> ServerContext<W>
where
    W: AsyncWrite + Unpin,
{
    /// Build a context with a fresh registry sized from the config
    pub fn new(config: ServerConfig) -> Self {
        let registry = Arc::new(Registry::new(config.max_clients));
        Self {
            broadcaster: Broadcaster::new(registry),
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &Arc<Registry<W>> {
        self.broadcaster.registry()
    }
}

/// Why a connection ended
#[derive(Debug)]
pub enum DisconnectReason {
    /// Peer closed the stream
    PeerClosed,
    /// Peer sent the exit command
    ExitCommand,
    /// Handshake, registration or transport failure
    Failed(AppError),
}

/// Connection lifecycle state
#[derive(Debug)]
enum HandlerState {
    Accepted,
    AwaitingHandshake,
    Active,
    Disconnecting(DisconnectReason),
    Terminated(DisconnectReason),
}

/// Per-connection state machine
pub struct ConnectionHandler<R, W> {
    id: ClientId,
    addr: SocketAddr,
    reader: R,
    /// Write half until it is moved into the registry
    writer: Option<W>,
    /// Set once the client is registered and announced
    nickname: Option<Nickname>,
    context: ServerContext<W>,
    buffer: Vec<u8>,
}

impl<R, W> ConnectionHandler<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(id: ClientId, addr: SocketAddr, reader: R, writer: W, context: ServerContext<W>) -> Self {
        let buffer = vec![0u8; context.config.buffer_size];
        Self {
            id,
            addr,
            reader,
            writer: Some(writer),
            nickname: None,
            context,
            buffer,
        }
    }

    /// Run the connection to completion
    pub async fn run(mut self) -> DisconnectReason {
        let mut state = HandlerState::Accepted;
        loop {
            state = match state {
                HandlerState::Accepted => HandlerState::AwaitingHandshake,
                HandlerState::AwaitingHandshake => self.handshake().await,
                HandlerState::Active => self.read_message().await,
                HandlerState::Disconnecting(reason) => {
                    self.teardown().await;
                    HandlerState::Terminated(reason)
                }
                HandlerState::Terminated(reason) => return reason,
            };
        }
    }

    /// Read the fixed-width nickname frame, register and announce
    async fn handshake(&mut self) -> HandlerState {
        let mut frame = vec![0u8; self.context.config.nickname_len];
        if let Err(e) = self.reader.read_exact(&mut frame).await {
            let error = match e.kind() {
                ErrorKind::UnexpectedEof => AppError::HandshakeClosed,
                _ => AppError::Io(e),
            };
            return HandlerState::Disconnecting(DisconnectReason::Failed(error));
        }

        let nickname = match Nickname::from_frame(&frame) {
            Ok(nickname) => nickname,
            Err(e) => {
                debug!("Client {} from {} sent a bad nickname", self.id, self.addr);
                return HandlerState::Disconnecting(DisconnectReason::Failed(e));
            }
        };

        let Some(writer) = self.writer.take() else {
            return HandlerState::Disconnecting(DisconnectReason::Failed(AppError::HandshakeClosed));
        };
        let record = ClientRecord::new(self.id, nickname.clone(), self.addr, writer);
        if let Err(e) = self.context.registry().register(record).await {
            warn!("Rejecting {} from {}: {}", nickname, self.addr, e);
            return HandlerState::Disconnecting(DisconnectReason::Failed(e));
        }

        info!("{} joined", nickname);
        self.context
            .broadcaster
            .announce(Announcement::Joined(&nickname), self.id)
            .await;
        self.nickname = Some(nickname);
        HandlerState::Active
    }

    /// Read one message and act on it
    async fn read_message(&mut self) -> HandlerState {
        let n = match self.reader.read(&mut self.buffer).await {
            Ok(0) => return HandlerState::Disconnecting(DisconnectReason::PeerClosed),
            Ok(n) => n,
            Err(e) => {
                warn!("Read from {} failed: {}", self.id, e);
                return HandlerState::Disconnecting(DisconnectReason::Failed(e.into()));
            }
        };

        match Inbound::classify(&self.buffer[..n]) {
            Inbound::Exit => HandlerState::Disconnecting(DisconnectReason::ExitCommand),
            Inbound::Empty => HandlerState::Active,
            Inbound::Chat(payload) => {
                let line = terminate_line(payload);
                if let Some(nickname) = &self.nickname {
                    info!("{} - {}", String::from_utf8_lossy(line.trim_ascii_end()), nickname);
                }
                self.context.broadcaster.broadcast(&line, self.id).await;
                HandlerState::Active
            }
        }
    }

    /// Announce departure, leave the registry and close the transport
    async fn teardown(&mut self) {
        let Some(nickname) = self.nickname.take() else {
            // Never registered: give back the accept-time reservation and
            // drop the write half, which closes it
            self.context.registry().unregister(self.id).await;
            self.writer = None;
            return;
        };

        info!("{} left", nickname);
        self.context
            .broadcaster
            .announce(Announcement::Left(&nickname), self.id)
            .await;
        if let Some(record) = self.context.registry().unregister(self.id).await {
            record.close().await;
        }
    }
}

/// Handle a newly accepted TCP connection
pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, id: ClientId, context: ServerContext) {
    let (reader, writer) = stream.into_split();
    debug!("Client {} connected from {}", id, addr);

    let reason = ConnectionHandler::new(id, addr, reader, writer, context).run().await;

    match reason {
        DisconnectReason::Failed(e) => debug!("Client {} from {} dropped: {}", id, addr, e),
        reason => debug!("Client {} from {} disconnected: {:?}", id, addr, reason),
    }
}
