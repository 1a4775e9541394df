//! Scripted transport for tests.
//!
//! [`MockTransport::new`] returns a device/handle pair plus the inbound
//! chunk channel the engine's receiver drains. Tests script the exchange on
//! the handle: each expectation matches an outbound frame by substring and
//! answers with a train of chunks, exactly as the module would.

use crate::traits::ModemTransport;
use bytes::Bytes;
use hydrolink_core::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const CHUNK_CHANNEL_DEPTH: usize = 32;

struct Script {
    matcher: String,
    replies: Vec<Bytes>,
    delay: Option<Duration>,
}

#[derive(Default)]
struct Shared {
    scripts: Mutex<Vec<Script>>,
    sent: Mutex<Vec<String>>,
    fail_next: Mutex<Option<String>>,
    resets: AtomicUsize,
}

impl Shared {
    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, Vec<Script>> {
        self.scripts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Transport half handed to the engine.
pub struct MockTransport {
    shared: Arc<Shared>,
    tx: mpsc::Sender<Bytes>,
}

/// Test-side handle; scripts expectations and inspects traffic.
pub struct MockHandle {
    shared: Arc<Shared>,
    tx: mpsc::Sender<Bytes>,
}

impl MockTransport {
    /// Create the pair and the inbound chunk channel.
    pub fn new() -> (MockTransport, MockHandle, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_DEPTH);
        let shared = Arc::new(Shared::default());
        (
            MockTransport {
                shared: Arc::clone(&shared),
                tx: tx.clone(),
            },
            MockHandle { shared, tx },
            rx,
        )
    }
}

impl ModemTransport for MockTransport {
    async fn send(&mut self, frame: &[u8]) -> Result<usize> {
        let text = String::from_utf8_lossy(frame).into_owned();
        debug!(frame = %text, "mock transport send");

        if let Some(reason) = self
            .shared
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            return Err(Error::SendFailed(reason));
        }

        self.shared
            .sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(text.clone());

        let script = {
            let mut scripts = self.shared.lock_scripts();
            scripts
                .iter()
                .position(|s| text.contains(&s.matcher))
                .map(|i| scripts.remove(i))
        };
        if let Some(script) = script {
            let tx = self.tx.clone();
            tokio::spawn(async move {
                if let Some(delay) = script.delay {
                    tokio::time::sleep(delay).await;
                }
                for reply in script.replies {
                    if tx.send(reply).await.is_err() {
                        break;
                    }
                }
            });
        }
        Ok(frame.len())
    }

    async fn hard_reset(&mut self) -> Result<()> {
        self.shared.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl MockHandle {
    /// Answer the next frame containing `matcher` with `replies`, one chunk
    /// each.
    pub fn expect(&self, matcher: &str, replies: &[&str]) {
        self.expect_after(matcher, replies, None);
    }

    /// Like [`MockHandle::expect`] with a delay before the first reply.
    pub fn expect_delayed(&self, matcher: &str, replies: &[&str], delay: Duration) {
        self.expect_after(matcher, replies, Some(delay));
    }

    /// Like [`MockHandle::expect`] with raw byte replies, for content
    /// payloads that are not valid UTF-8.
    pub fn expect_bytes(&self, matcher: &str, replies: &[&[u8]]) {
        self.shared.lock_scripts().push(Script {
            matcher: matcher.to_string(),
            replies: replies.iter().map(|r| Bytes::copy_from_slice(r)).collect(),
            delay: None,
        });
    }

    fn expect_after(&self, matcher: &str, replies: &[&str], delay: Option<Duration>) {
        self.shared.lock_scripts().push(Script {
            matcher: matcher.to_string(),
            replies: replies
                .iter()
                .map(|r| Bytes::copy_from_slice(r.as_bytes()))
                .collect(),
            delay,
        });
    }

    /// Push an unsolicited chunk to the engine.
    pub fn inject(&self, chunk: &str) {
        // The channel is deep enough for any test script.
        let _ = self.tx.try_send(Bytes::copy_from_slice(chunk.as_bytes()));
    }

    /// Make the next send fail with the given reason.
    pub fn fail_next_send(&self, reason: &str) {
        *self
            .shared
            .fail_next
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(reason.to_string());
    }

    /// Frames sent so far, in order.
    pub fn sent(&self) -> Vec<String> {
        self.shared
            .sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of hard resets performed.
    pub fn resets(&self) -> usize {
        self.shared.resets.load(Ordering::SeqCst)
    }

    /// Number of scripted expectations not yet consumed.
    pub fn pending(&self) -> usize {
        self.shared.lock_scripts().len()
    }
}
