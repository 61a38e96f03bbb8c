//! End-to-end tests against a real listener on 127.0.0.1.
//!
//! Every wait is bounded so a broken relay fails instead of hanging.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};

use chat_relay::message::{encode_handshake, NICKNAME_FRAME_LEN};
use chat_relay::{ChatClient, ChatServer, Nickname, Registry, ServerConfig};

/// Upper bound for any expected event
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait when asserting that nothing arrives
const QUIET_PERIOD: Duration = Duration::from_millis(200);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

async fn spawn_server(max_clients: usize) -> (SocketAddr, Arc<Registry>) {
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        max_clients,
        ..ServerConfig::default()
    };
    let server = ChatServer::bind(config).await.expect("bind server");
    let addr = server.local_addr().expect("local addr");
    let registry = server.registry();
    tokio::spawn(server.run());
    (addr, registry)
}

async fn join(addr: SocketAddr, name: &str) -> ChatClient {
    let nickname = Nickname::parse(name).unwrap();
    ChatClient::connect(addr, &nickname).await.expect("connect")
}

async fn wait_for_clients(registry: &Registry, expected: usize) {
    let start = tokio::time::Instant::now();
    loop {
        let registered = registry.registered().await;
        if registered == expected {
            return;
        }
        assert!(
            start.elapsed() < RECV_TIMEOUT,
            "registry has {registered} clients, expected {expected}"
        );
        sleep(POLL_INTERVAL).await;
    }
}

async fn wait_for_slots(registry: &Registry, expected: usize) {
    let start = tokio::time::Instant::now();
    loop {
        let used = registry.len().await;
        if used == expected {
            return;
        }
        assert!(
            start.elapsed() < RECV_TIMEOUT,
            "registry has {used} slots in use, expected {expected}"
        );
        sleep(POLL_INTERVAL).await;
    }
}

fn frame(name: &str) -> Vec<u8> {
    encode_handshake(&Nickname::parse(name).unwrap(), NICKNAME_FRAME_LEN).unwrap()
}

async fn expect_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let read = timeout(RECV_TIMEOUT, stream.read(&mut buf))
        .await
        .expect("server should close the connection");
    assert!(matches!(read, Ok(0) | Err(_)), "server should close the connection");
}

async fn expect_line(client: &mut ChatClient) -> String {
    timeout(RECV_TIMEOUT, client.recv_line())
        .await
        .expect("timed out waiting for a line")
        .expect("receive failed")
        .expect("connection closed")
}

async fn expect_silence(client: &mut ChatClient) {
    assert!(
        timeout(QUIET_PERIOD, client.recv_line()).await.is_err(),
        "expected no traffic"
    );
}

#[tokio::test]
async fn test_join_chat_and_exit() {
    let (addr, registry) = spawn_server(100).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;
    let mut bob = join(addr, "bob").await;

    assert_eq!(expect_line(&mut alice).await, "bob joined");

    bob.send(b"hello\n").await.unwrap();
    assert_eq!(expect_line(&mut alice).await, "hello");
    expect_silence(&mut bob).await;

    bob.send(b"exit").await.unwrap();
    assert_eq!(expect_line(&mut alice).await, "bob left");
    assert!(timeout(RECV_TIMEOUT, bob.recv_line()).await.unwrap().unwrap().is_none());
    wait_for_clients(&registry, 1).await;
}

#[tokio::test]
async fn test_message_delivered_exactly_once() {
    let (addr, registry) = spawn_server(100).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;
    let mut bob = join(addr, "bob").await;
    assert_eq!(expect_line(&mut alice).await, "bob joined");

    alice.send(b"[alice]: hi bob\n").await.unwrap();
    assert_eq!(expect_line(&mut bob).await, "[alice]: hi bob");
    expect_silence(&mut bob).await;
    expect_silence(&mut alice).await;
}

#[tokio::test]
async fn test_disconnect_announces_departure() {
    let (addr, registry) = spawn_server(100).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;
    let bob = join(addr, "bob").await;
    assert_eq!(expect_line(&mut alice).await, "bob joined");

    drop(bob);
    assert_eq!(expect_line(&mut alice).await, "bob left");
    wait_for_clients(&registry, 1).await;
}

#[tokio::test]
async fn test_short_nickname_never_announced() {
    let (addr, registry) = spawn_server(100).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;

    let mut shorty = TcpStream::connect(addr).await.unwrap();
    let mut short_frame = [0u8; NICKNAME_FRAME_LEN];
    short_frame[0] = b'x';
    shorty.write_all(&short_frame).await.unwrap();
    expect_closed(&mut shorty).await;

    let _eve = join(addr, "eve").await;
    assert_eq!(expect_line(&mut alice).await, "eve joined");
    assert_eq!(registry.registered().await, 2);
}

#[tokio::test]
async fn test_capacity_rejects_third_client() {
    let (addr, registry) = spawn_server(2).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;
    let mut bob = join(addr, "bob").await;
    assert_eq!(expect_line(&mut alice).await, "bob joined");

    // Rejected at accept, so the frame may or may not make it out
    let mut carol = TcpStream::connect(addr).await.unwrap();
    let _ = carol.write_all(&frame("carol")).await;
    expect_closed(&mut carol).await;
    expect_silence(&mut alice).await;
    assert_eq!(registry.registered().await, 2);

    // The first two are unaffected
    bob.send(b"still here\n").await.unwrap();
    assert_eq!(expect_line(&mut alice).await, "still here");
}

#[tokio::test]
async fn test_slot_freed_after_departure() {
    let (addr, registry) = spawn_server(2).await;

    let mut alice = join(addr, "alice").await;
    wait_for_clients(&registry, 1).await;
    let mut bob = join(addr, "bob").await;
    assert_eq!(expect_line(&mut alice).await, "bob joined");

    bob.send(b"exit").await.unwrap();
    assert_eq!(expect_line(&mut alice).await, "bob left");
    wait_for_clients(&registry, 1).await;

    let _carol = join(addr, "carol").await;
    assert_eq!(expect_line(&mut alice).await, "carol joined");
    assert_eq!(registry.registered().await, 2);
}

#[tokio::test]
async fn test_capacity_counts_connections_still_in_handshake() {
    let (addr, registry) = spawn_server(2).await;

    // Two connections that have not sent their nickname yet
    let first = TcpStream::connect(addr).await.unwrap();
    let mut second = TcpStream::connect(addr).await.unwrap();
    wait_for_slots(&registry, 2).await;
    assert_eq!(registry.registered().await, 0);

    // The third is closed without ever sending a byte
    let mut third = TcpStream::connect(addr).await.unwrap();
    expect_closed(&mut third).await;
    assert_eq!(registry.len().await, 2);

    // The held slots are still good for the first two
    let mut first = BufReader::new(first);
    first.get_mut().write_all(&frame("alice")).await.unwrap();
    wait_for_clients(&registry, 1).await;
    second.write_all(&frame("bob")).await.unwrap();

    let mut line = String::new();
    timeout(RECV_TIMEOUT, first.read_line(&mut line))
        .await
        .expect("timed out waiting for a line")
        .expect("receive failed");
    assert_eq!(line, "bob joined\n");
    wait_for_clients(&registry, 2).await;
}
