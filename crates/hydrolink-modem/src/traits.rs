//! Transport and scheduler seams.
//!
//! The engine talks to the modem through [`ModemTransport`] so the same
//! dispatch logic runs against a UART-backed implementation on the
//! appliance and [`crate::mock::MockTransport`] in tests. Traits use native
//! `async fn` (Edition 2024 RPITIT); no `async_trait` macro is needed.

#![allow(async_fn_in_trait)]

use hydrolink_core::Result;

/// Byte transport to the modem.
///
/// Outbound frames are whole AT command lines. Inbound bytes do not flow
/// through this trait: the transport owns its receive task and hands
/// idle-delimited chunks (≤ 1024 bytes) to the engine over an mpsc channel.
pub trait ModemTransport: Send + Sync {
    /// Transmit one command frame; returns the number of bytes written.
    async fn send(&mut self, frame: &[u8]) -> Result<usize>;

    /// Power-cycle the module via its reset line.
    ///
    /// Implementations assert the line for 1 s and allow 2 s for the module
    /// to boot before returning.
    async fn hard_reset(&mut self) -> Result<()>;
}

/// Scheduling hook raised around the send-and-wait window.
///
/// On the appliance the dispatch task is boosted while a command is in
/// flight so response handling is not starved by application tasks. Off
/// target this is a no-op; tests use it to assert balanced raise/restore.
pub trait SchedulerHook: Send + Sync {
    fn raise(&self);
    fn restore(&self);
}

/// Hook that does nothing; the default off-target scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopScheduler;

impl SchedulerHook for NoopScheduler {
    fn raise(&self) {}
    fn restore(&self) {}
}

/// Scoped priority elevation.
///
/// Raises on construction and restores on drop, so every exit path out of
/// the dispatch window — success, send failure, timeout — restores the
/// original priority.
pub struct PriorityGuard<'a> {
    hook: &'a dyn SchedulerHook,
}

impl<'a> PriorityGuard<'a> {
    pub fn raise(hook: &'a dyn SchedulerHook) -> Self {
        hook.raise();
        Self { hook }
    }
}

impl Drop for PriorityGuard<'_> {
    fn drop(&mut self) {
        self.hook.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHook {
        raised: AtomicUsize,
        restored: AtomicUsize,
    }

    impl SchedulerHook for CountingHook {
        fn raise(&self) {
            self.raised.fetch_add(1, Ordering::SeqCst);
        }
        fn restore(&self) {
            self.restored.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn guard_restores_on_drop() {
        let hook = CountingHook::default();
        {
            let _guard = PriorityGuard::raise(&hook);
            assert_eq!(hook.raised.load(Ordering::SeqCst), 1);
            assert_eq!(hook.restored.load(Ordering::SeqCst), 0);
        }
        assert_eq!(hook.restored.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_restores_on_panic_unwind() {
        let hook = CountingHook::default();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = PriorityGuard::raise(&hook);
            panic!("boom");
        }));
        assert!(result.is_err());
        assert_eq!(hook.raised.load(Ordering::SeqCst), 1);
        assert_eq!(hook.restored.load(Ordering::SeqCst), 1);
    }
}
