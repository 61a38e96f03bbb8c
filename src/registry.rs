//! Client registry
//!
//! Bounded slot table of connected clients. A single mutex guards every
//! slot; reservation, registration, removal and broadcast iteration all go
//! through it, so no record can be closed while another task is writing to
//! it. Slot occupancy is the only client count.

use tokio::io::AsyncWrite;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::client::ClientRecord;
use crate::error::AppError;
use crate::types::ClientId;

/// One capacity unit
enum Slot<W> {
    Free,
    /// Held for an accepted connection that has not finished its handshake
    Reserved(ClientId),
    Occupied(ClientRecord<W>),
}

impl<W> Slot<W> {
    fn holds(&self, id: ClientId) -> bool {
        match self {
            Slot::Free => false,
            Slot::Reserved(reserved) => *reserved == id,
            Slot::Occupied(record) => record.id == id,
        }
    }
}

/// Thread-safe registry of connected clients
pub struct Registry<W = OwnedWriteHalf> {
    capacity: usize,
    slots: Mutex<Vec<Slot<W>>>,
}

impl<W> Registry<W>
where
    W: AsyncWrite + Unpin,
{
    /// Create an empty registry with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Free);
        Self {
            capacity,
            slots: Mutex::new(slots),
        }
    }

    /// Hold a slot for a connection that is about to handshake
    ///
    /// The slot counts against capacity until `register` fills it or
    /// `unregister` releases it.
    pub async fn reserve(&self, id: ClientId) -> Result<usize, AppError> {
        let mut slots = self.slots.lock().await;
        let Some(index) = slots.iter().position(|slot| matches!(slot, Slot::Free)) else {
            return Err(AppError::CapacityExceeded(self.capacity));
        };
        slots[index] = Slot::Reserved(id);
        Ok(index)
    }

    /// Place a record into its reserved slot, or the first free one
    ///
    /// Returns the slot index. When no slot is available the record is
    /// dropped, which closes its transport.
    pub async fn register(&self, record: ClientRecord<W>) -> Result<usize, AppError> {
        let mut slots = self.slots.lock().await;
        let index = slots
            .iter()
            .position(|slot| matches!(slot, Slot::Reserved(id) if *id == record.id))
            .or_else(|| slots.iter().position(|slot| matches!(slot, Slot::Free)));
        let Some(index) = index else {
            return Err(AppError::CapacityExceeded(self.capacity));
        };
        debug!("Client {} ({}) takes slot {}", record.id, record.nickname, index);
        slots[index] = Slot::Occupied(record);
        Ok(index)
    }

    /// Free the slot held by `id`, handing a registered record back
    ///
    /// Releases a bare reservation too. No-op when the id holds no slot.
    pub async fn unregister(&self, id: ClientId) -> Option<ClientRecord<W>> {
        let mut slots = self.slots.lock().await;
        let slot = slots.iter_mut().find(|slot| slot.holds(id))?;
        match std::mem::replace(slot, Slot::Free) {
            Slot::Occupied(record) => Some(record),
            Slot::Reserved(_) | Slot::Free => None,
        }
    }

    /// Lock the table and expose every registered record except `excluded`
    ///
    /// The lock is held until the returned guard is dropped, so records
    /// seen through it cannot be registered or removed mid-traversal.
    pub async fn peers_except(&self, excluded: ClientId) -> Peers<'_, W> {
        Peers {
            slots: self.slots.lock().await,
            excluded,
        }
    }

    /// Number of slots in use, reserved or registered
    pub async fn len(&self) -> usize {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|slot| !matches!(slot, Slot::Free))
            .count()
    }

    /// Check if no slot is in use
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of clients that completed their handshake
    pub async fn registered(&self) -> usize {
        self.slots
            .lock()
            .await
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied(_)))
            .count()
    }

    /// Maximum number of connected clients
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Check if every slot is in use
    pub async fn is_full(&self) -> bool {
        self.len().await >= self.capacity
    }
}

/// Locked view of the registry minus one client
pub struct Peers<'a, W> {
    slots: MutexGuard<'a, Vec<Slot<W>>>,
    excluded: ClientId,
}

impl<W> Peers<'_, W> {
    /// Iterate over every registered record except the excluded one
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ClientRecord<W>> {
        let excluded = self.excluded;
        self.slots.iter_mut().filter_map(move |slot| match slot {
            Slot::Occupied(record) if record.id != excluded => Some(record),
            _ => None,
        })
    }
}
