//! Engine configuration.

use hydrolink_core::constants::{
    CONTENT_BUFFER_CAPACITY, EXECUTION_LOCK_TIMEOUT_MS, POLL_SUBWAIT_MS, RESPONSE_GRACE_MS,
    RX_CHUNK_SIZE, SETTLE_DELAY_MS, SLOT_COUNT,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for [`crate::ModemEngine`].
///
/// The defaults are the field-proven values of the appliance firmware;
/// tests shrink the delays to keep runs fast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long `execute` waits for the execution lock.
    pub lock_timeout: Duration,
    /// Quiet period between acquiring the lock and transmitting.
    pub settle_delay: Duration,
    /// Grace window added on top of every command timeout.
    pub response_grace: Duration,
    /// Sub-wait used inside the response poll loop.
    pub poll_subwait: Duration,
    /// Number of staging slots in the framing pool.
    pub slot_count: usize,
    /// Capacity of each staging slot.
    pub slot_size: usize,
    /// Capacity of the assembled HTTP content buffer.
    pub content_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(EXECUTION_LOCK_TIMEOUT_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            response_grace: Duration::from_millis(RESPONSE_GRACE_MS),
            poll_subwait: Duration::from_millis(POLL_SUBWAIT_MS),
            slot_count: SLOT_COUNT,
            slot_size: RX_CHUNK_SIZE,
            content_capacity: CONTENT_BUFFER_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Configuration with all delays collapsed, for tests.
    pub fn fast() -> Self {
        Self {
            lock_timeout: Duration::from_millis(200),
            settle_delay: Duration::ZERO,
            response_grace: Duration::from_millis(50),
            poll_subwait: Duration::from_millis(100),
            ..Self::default()
        }
    }
}
