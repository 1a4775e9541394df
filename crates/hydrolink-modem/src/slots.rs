//! Double-buffered staging pool for inbound chunks.
//!
//! Two fixed slots decouple the transport's receive task from response
//! evaluation: one slot can be written while the other is processed. A
//! counting semaphore tracks free slots — its permit count always equals
//! the number of `Free` slots — and a mutex serialises state transitions.
//!
//! Lifecycle: `Free → Writing → Ready → Processing → Free`.

use bytes::{Bytes, BytesMut};
use hydrolink_core::{Error, Result};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// State of one staging slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Available for a writer.
    Free,
    /// A writer holds the slot.
    Writing,
    /// Filled, waiting for a reader.
    Ready,
    /// A reader is consuming the slot.
    Processing,
}

#[derive(Debug)]
struct Slot {
    state: SlotState,
    data: BytesMut,
}

/// Fixed pool of staging slots.
#[derive(Debug)]
pub struct SlotPool {
    slots: Mutex<Vec<Slot>>,
    free: Semaphore,
    slot_size: usize,
}

impl SlotPool {
    /// Create a pool of `count` slots of `slot_size` bytes each.
    pub fn new(count: usize, slot_size: usize) -> Self {
        let slots = (0..count)
            .map(|_| Slot {
                state: SlotState::Free,
                data: BytesMut::with_capacity(slot_size),
            })
            .collect();
        Self {
            slots: Mutex::new(slots),
            free: Semaphore::new(count),
            slot_size,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Slot>> {
        // A poisoned pool still holds structurally valid state.
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of slots currently free.
    pub fn free_count(&self) -> usize {
        self.free.available_permits()
    }

    /// Claim a free slot for writing, waiting up to `timeout` for one.
    ///
    /// The claimed permit is not returned until the slot goes back to
    /// `Free` via [`SlotPool::release`].
    pub async fn acquire_for_write(&self, timeout: Duration) -> Result<usize> {
        let permit = tokio::time::timeout(timeout, self.free.acquire())
            .await
            .map_err(|_| Error::LockTimeout(timeout.as_millis() as u64))?
            .map_err(|_| Error::ChannelClosed)?;
        permit.forget();

        let mut slots = self.lock();
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.state == SlotState::Free {
                slot.state = SlotState::Writing;
                debug!(index, "staging slot acquired for write");
                return Ok(index);
            }
        }
        // Permit count and Free count always agree; reaching here means the
        // pool invariant is broken.
        unreachable!("semaphore permit granted with no free slot");
    }

    /// Copy a chunk into a slot held in `Writing` state.
    pub fn write(&self, index: usize, chunk: &[u8]) -> Result<()> {
        if chunk.len() > self.slot_size {
            return Err(Error::InvalidArgument(format!(
                "chunk of {} bytes exceeds slot size {}",
                chunk.len(),
                self.slot_size
            )));
        }
        let mut slots = self.lock();
        let slot = &mut slots[index];
        if slot.state != SlotState::Writing {
            return Err(Error::InvalidArgument(format!(
                "slot {index} is not in Writing state"
            )));
        }
        slot.data.clear();
        slot.data.extend_from_slice(chunk);
        Ok(())
    }

    /// Mark a written slot ready for processing (`Writing → Ready`).
    pub fn commit(&self, index: usize) -> Result<()> {
        let mut slots = self.lock();
        let slot = &mut slots[index];
        if slot.state != SlotState::Writing {
            warn!(index, state = ?slot.state, "commit refused, slot not in Writing state");
            return Err(Error::InvalidArgument(format!(
                "slot {index} is not in Writing state"
            )));
        }
        slot.state = SlotState::Ready;
        Ok(())
    }

    /// Take the next ready slot for processing (`Ready → Processing`).
    ///
    /// Returns the slot index and a copy of its content, or `None` when no
    /// slot is ready.
    pub fn acquire_ready(&self) -> Option<(usize, Bytes)> {
        let mut slots = self.lock();
        for (index, slot) in slots.iter_mut().enumerate() {
            if slot.state == SlotState::Ready {
                slot.state = SlotState::Processing;
                return Some((index, Bytes::copy_from_slice(&slot.data)));
            }
        }
        None
    }

    /// Return a slot to `Free`, zeroing its content.
    ///
    /// Idempotent: releasing an already-free slot is a no-op and does not
    /// inflate the permit count.
    pub fn release(&self, index: usize) {
        let mut slots = self.lock();
        let slot = &mut slots[index];
        if slot.state == SlotState::Free {
            return;
        }
        slot.state = SlotState::Free;
        slot.data.clear();
        drop(slots);
        self.free.add_permits(1);
    }

    /// Force every slot back to `Free` and restore all permits.
    pub fn reset(&self) {
        let mut slots = self.lock();
        let mut reclaimed = 0;
        for slot in slots.iter_mut() {
            if slot.state != SlotState::Free {
                slot.state = SlotState::Free;
                slot.data.clear();
                reclaimed += 1;
            }
        }
        drop(slots);
        self.free.add_permits(reclaimed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> SlotPool {
        SlotPool::new(2, 64)
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let pool = pool();
        assert_eq!(pool.free_count(), 2);

        let idx = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(pool.free_count(), 1);
        pool.write(idx, b"OK\r\n").unwrap();
        pool.commit(idx).unwrap();

        let (ridx, data) = pool.acquire_ready().unwrap();
        assert_eq!(ridx, idx);
        assert_eq!(&data[..], b"OK\r\n");

        pool.release(ridx);
        assert_eq!(pool.free_count(), 2);
    }

    #[tokio::test]
    async fn exhaustion_times_out() {
        let pool = pool();
        let a = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        let b = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(pool.free_count(), 0);

        let err = pool.acquire_for_write(Duration::from_millis(10)).await;
        assert!(matches!(err, Err(Error::LockTimeout(_))));

        pool.release(a);
        assert!(
            pool.acquire_for_write(Duration::from_millis(10))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn release_is_idempotent() {
        let pool = pool();
        let idx = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        pool.release(idx);
        pool.release(idx);
        pool.release(idx);
        // Permits must not exceed the slot count.
        assert_eq!(pool.free_count(), 2);
    }

    #[tokio::test]
    async fn release_zeroes_content() {
        let pool = pool();
        let idx = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        pool.write(idx, b"secret").unwrap();
        pool.commit(idx).unwrap();
        pool.release(idx);

        let idx2 = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        pool.commit(idx2).unwrap();
        let (_, data) = pool.acquire_ready().unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn commit_requires_writing_state() {
        let pool = pool();
        assert!(pool.commit(0).is_err());

        let idx = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        pool.commit(idx).unwrap();
        assert!(pool.commit(idx).is_err());
    }

    #[tokio::test]
    async fn write_rejects_oversized_chunk() {
        let pool = pool();
        let idx = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        assert!(pool.write(idx, &[0u8; 65]).is_err());
        assert!(pool.write(idx, &[0u8; 64]).is_ok());
    }

    #[tokio::test]
    async fn acquire_ready_with_nothing_ready() {
        let pool = pool();
        assert!(pool.acquire_ready().is_none());
    }

    #[tokio::test]
    async fn reset_reclaims_everything() {
        let pool = pool();
        let _a = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        let _b = pool
            .acquire_for_write(Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(pool.free_count(), 0);
        pool.reset();
        assert_eq!(pool.free_count(), 2);
    }
}
