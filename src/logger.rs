//! Logging setup shared by the server and client binaries.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber
///
/// `RUST_LOG` overrides the default, e.g. `RUST_LOG=chat_relay=debug`.
pub fn setup_logger(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("chat_relay={default_level}"))),
        )
        .init();
}
