//! ChatServer accept loop
//!
//! Owns the listener and the shared context. Every accepted connection takes
//! a registry slot and runs on its own detached task; the loop never waits on
//! a handler.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::handler::{handle_connection, ServerContext};
use crate::registry::Registry;
use crate::types::ClientIdAllocator;

/// The chat relay server
pub struct ChatServer {
    listener: TcpListener,
    context: ServerContext,
    ids: ClientIdAllocator,
}

impl ChatServer {
    /// Validate the config and bind the listening socket
    ///
    /// This is the only step whose failure is fatal to the process.
    pub async fn bind(config: ServerConfig) -> Result<Self, AppError> {
        config.validate()?;
        let listener = TcpListener::bind(config.bind_addr()?).await?;
        info!(
            "Chat relay listening on {} (max {} clients)",
            listener.local_addr()?,
            config.max_clients
        );

        Ok(Self {
            listener,
            context: ServerContext::new(config),
            ids: ClientIdAllocator::new(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        Ok(self.listener.local_addr()?)
    }

    /// Shared client registry
    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(self.context.registry())
    }

    /// Run the accept loop forever
    pub async fn run(self) {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            // The slot is held from accept until the handler tears down
            let id = self.ids.next_id();
            if let Err(e) = self.context.registry().reserve(id).await {
                warn!("{}, rejecting {}", e, addr);
                drop(stream);
                continue;
            }

            let context = self.context.clone();
            tokio::spawn(handle_connection(stream, addr, id, context));
        }
    }
}
