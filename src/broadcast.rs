//! Broadcast engine
//!
//! Fans one payload out to every registered client except its sender.

use std::sync::Arc;

use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedWriteHalf;
use tracing::{debug, warn};

use crate::message::Announcement;
use crate::registry::Registry;
use crate::types::ClientId;

/// Outcome of one broadcast pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients whose write completed
    pub delivered: usize,
    /// Recipients whose write failed
    pub failed: Vec<ClientId>,
}

/// Sends payloads to all registered peers
///
/// Cheap to clone; every clone shares the same registry.
pub struct Broadcaster<W = OwnedWriteHalf> {
    registry: Arc<Registry<W>>,
}

impl<W> Clone for Broadcaster<W> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<W> Broadcaster<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create a broadcaster over the given registry
    pub fn new(registry: Arc<Registry<W>>) -> Self {
        Self { registry }
    }

    /// The registry this broadcaster delivers to
    pub fn registry(&self) -> &Arc<Registry<W>> {
        &self.registry
    }

    /// Deliver `payload` to every registered client except `sender`
    ///
    /// The registry stays locked for the whole pass. A failed write is
    /// logged and recorded; delivery continues with the next recipient.
    pub async fn broadcast(&self, payload: &[u8], sender: ClientId) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut peers = self.registry.peers_except(sender).await;

        for record in peers.iter_mut() {
            match record.send(payload).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!(
                        "Failed to deliver to {} ({}) at {}: {}",
                        record.id, record.nickname, record.addr, e
                    );
                    report.failed.push(record.id);
                }
            }
        }

        debug!(
            "Broadcast from {}: {} delivered, {} failed",
            sender,
            report.delivered,
            report.failed.len()
        );
        report
    }

    /// Broadcast a join/leave announcement on behalf of `sender`
    pub async fn announce(&self, announcement: Announcement<'_>, sender: ClientId) -> BroadcastReport {
        self.broadcast(&announcement.to_bytes(), sender).await
    }
}
