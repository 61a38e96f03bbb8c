//! Multi-client TCP Chat Relay Library
//!
//! Clients connect over TCP, send a fixed-width nickname frame, and every
//! message they send afterwards is relayed to all other connected clients.
//!
//! # Features
//! - Bounded client registry with a single lock
//! - Join/leave announcements
//! - Broadcast that tolerates individual send failures
//! - `exit` command for voluntary departure
//! - Line-based client connector
//!
//! # Architecture
//! One tokio task per connection plus the accept loop:
//! - `ChatServer` accepts connections and enforces capacity
//! - `ConnectionHandler` owns one client's transport and lifecycle
//! - `Registry` holds registered clients behind one mutex
//! - `Broadcaster` fans messages out while holding that mutex
//!
//! # Example
//! ```no_run
//! use chat_relay::{ChatServer, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_relay::AppError> {
//!     let server = ChatServer::bind(ServerConfig::with_port(9000)).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod chat_client;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod logger;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

// Re-export main types for convenience
pub use broadcast::{BroadcastReport, Broadcaster};
pub use chat_client::ChatClient;
pub use client::ClientRecord;
pub use config::ServerConfig;
pub use error::{AppError, SendError};
pub use handler::{handle_connection, ConnectionHandler, DisconnectReason, ServerContext};
pub use message::{Announcement, Inbound};
pub use registry::Registry;
pub use server::ChatServer;
pub use types::{ClientId, ClientIdAllocator, Nickname};
