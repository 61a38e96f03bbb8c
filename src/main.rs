//! Chat Relay Server - Entry Point
//!
//! Parses the command line, binds the listener and runs the accept loop.

use clap::Parser;

use chat_relay::config::DEFAULT_MAX_CLIENTS;
use chat_relay::logger::setup_logger;
use chat_relay::{ChatServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "chat_relay")]
#[command(about = "Multi-client TCP chat relay", long_about = None)]
struct Args {
    /// Port to listen on
    port: u16,

    /// Interface to bind
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Maximum number of concurrent clients
    #[arg(short = 'm', long, default_value_t = DEFAULT_MAX_CLIENTS)]
    max_clients: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG env var to control log level
    setup_logger("info");

    let args = Args::parse();
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        max_clients: args.max_clients,
        ..ServerConfig::default()
    };

    // Bind failure exits with a non-zero status
    let server = ChatServer::bind(config).await?;
    server.run().await;

    Ok(())
}
