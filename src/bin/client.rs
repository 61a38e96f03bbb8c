//! Chat Relay Client - Entry Point
//!
//! Reads a nickname, connects, then relays stdin lines to the server and
//! prints everything the server sends back.

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use chat_relay::logger::setup_logger;
use chat_relay::message::NICKNAME_FRAME_LEN;
use chat_relay::{ChatClient, Nickname};

#[derive(Parser, Debug)]
#[command(name = "chat_relay_client")]
#[command(about = "Terminal client for the chat relay", long_about = None)]
struct Args {
    /// Server host name or IP address
    host: String,

    /// Server port
    port: u16,
}

/// Longest nickname that still fits the handshake frame with a terminator
const MAX_NICKNAME_CHARS: usize = NICKNAME_FRAME_LEN - 2;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_logger("warn");
    let args = Args::parse();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    print!("Enter your nickname: ");
    std::io::stdout().flush()?;
    let raw = stdin.next_line().await?.unwrap_or_default();
    let nickname = Nickname::parse(&raw)?;
    if nickname.as_str().len() > MAX_NICKNAME_CHARS {
        return Err(format!("nickname must be 2 to {MAX_NICKNAME_CHARS} characters").into());
    }

    let addr = tokio::net::lookup_host((args.host.as_str(), args.port))
        .await?
        .next()
        .ok_or("could not resolve server address")?;
    let client = ChatClient::connect(addr, &nickname).await?;
    println!("=== Connected to chat server ===");

    let (mut incoming, mut outgoing) = client.into_split();

    let mut receiver = tokio::spawn(async move {
        let mut line = String::new();
        loop {
            line.clear();
            match incoming.read_line(&mut line).await {
                Ok(0) => {
                    println!("Server connection lost");
                    break;
                }
                Ok(_) => print!("{line}"),
                Err(e) => {
                    error!("Receive error: {}", e);
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut receiver => break,
            line = stdin.next_line() => {
                let Some(text) = line? else { break };
                let text = text.trim_end();
                if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
                    outgoing.write_all(b"exit").await?;
                    break;
                }
                let formatted = format!("[{nickname}]: {text}\n");
                outgoing.write_all(formatted.as_bytes()).await?;
            }
        }
    }

    debug!("Closing connection");
    let _ = outgoing.shutdown().await;
    Ok(())
}
