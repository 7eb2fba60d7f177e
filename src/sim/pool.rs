//! Fixed-capacity entity pools
//!
//! Every entity type lives in a `Pool<T>`: a pre-sized array of slots, each
//! with an `active` flag. Spawning takes the first inactive slot (linear scan
//! from index 0) and a full pool drops the spawn. Slots are never freed or
//! reallocated for the lifetime of the pool.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Spawn failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// Every slot is active; the spawn was discarded
    #[error("pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
}

/// One pool slot. The payload of an inactive slot is stale and may be
/// overwritten by the next spawn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSlot<T> {
    pub active: bool,
    pub payload: T,
}

/// Fixed-capacity slot array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pool<T> {
    slots: Vec<PoolSlot<T>>,
    /// Number of spawns rejected because the pool was full
    dropped: u64,
}

impl<T: Default> Pool<T> {
    /// Create a pool with `capacity` inactive slots
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, PoolSlot::default);
        Self { slots, dropped: 0 }
    }
}

impl<T> Pool<T> {
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.active)
    }

    /// Spawns rejected since creation (or the last `clear`)
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Activate the first free slot with `payload`.
    ///
    /// Returns the slot index, or `SpawnError::PoolExhausted` when every slot
    /// is taken. A rejected spawn only bumps the drop counter.
    pub fn spawn(&mut self, payload: T) -> Result<usize, SpawnError> {
        match self.slots.iter().position(|s| !s.active) {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.payload = payload;
                slot.active = true;
                Ok(index)
            }
            None => {
                self.dropped += 1;
                log::trace!("spawn dropped, pool of {} is full", self.slots.len());
                Err(SpawnError::PoolExhausted {
                    capacity: self.slots.len(),
                })
            }
        }
    }

    /// Clear the active flag. Deactivating an inactive or out-of-range slot is
    /// a no-op.
    pub fn deactivate(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.active = false;
        }
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.active)
    }

    /// Payload of an active slot
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots
            .get(index)
            .filter(|s| s.active)
            .map(|s| &s.payload)
    }

    /// Mutable payload of an active slot
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.slots
            .get_mut(index)
            .filter(|s| s.active)
            .map(|s| &mut s.payload)
    }

    /// Deactivate every slot and reset the drop counter
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.active = false;
        }
        self.dropped = 0;
    }

    /// Active slots in index order
    pub fn iter_active(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (i, &s.payload))
    }

    /// Mutable active slots in index order
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (usize, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| (i, &mut s.payload))
    }

    /// Visit every active slot in index order
    pub fn for_each_active<F>(&self, mut visit: F)
    where
        F: FnMut(usize, &T),
    {
        for (i, payload) in self.iter_active() {
            visit(i, payload);
        }
    }

    /// Raw slot access for passes that need to flip `active` while walking
    /// payloads (the integrator).
    pub(crate) fn slots_mut(&mut self) -> &mut [PoolSlot<T>] {
        &mut self.slots
    }
}
