//! Command dispatcher.
//!
//! [`ModemEngine::execute`] is the only path that writes to the transport.
//! A tokio mutex serialises dispatches so at most one command is in flight;
//! the module cannot interleave responses, so neither do we.

use crate::config::EngineConfig;
use crate::data::ModemData;
use crate::response::evaluate;
use crate::slots::SlotPool;
use crate::traits::{ModemTransport, NoopScheduler, PriorityGuard, SchedulerHook};
use bytes::Bytes;
use hydrolink_core::{Error, Outcome, Result};
use hydrolink_protocol::{Command, CommandKind, ContentAssembler};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, info, trace, warn};

/// The command currently awaiting its response.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) kind: CommandKind,
    /// Written once, with the first terminal verdict. `Waiting` is never
    /// stored and later chunks cannot overwrite a decided dispatch.
    pub(crate) outcome: Option<Outcome>,
    pub(crate) done: Arc<Notify>,
}

/// Mutable dispatch state shared between `execute` and the receive path.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) current: Option<InFlight>,
    /// Set while an HTTP response body is being reassembled; chunks are fed
    /// to the assembler instead of the normal matchers.
    pub(crate) content_active: bool,
    pub(crate) assembler: ContentAssembler,
}

/// AT command engine over a byte transport.
pub struct ModemEngine<T: ModemTransport> {
    config: EngineConfig,
    transport: Mutex<T>,
    session: StdMutex<Session>,
    /// Serialises dispatches: one command in flight at a time.
    exec_lock: Mutex<()>,
    /// Serialises whole HTTP transactions (several commands each).
    pub(crate) http_lock: Mutex<()>,
    pool: SlotPool,
    data: ModemData,
    scheduler: Arc<dyn SchedulerHook>,
}

impl<T: ModemTransport> ModemEngine<T> {
    pub fn new(transport: T, config: EngineConfig) -> Self {
        Self::with_scheduler(transport, config, Arc::new(NoopScheduler))
    }

    /// Engine with an explicit scheduling hook raised around each dispatch.
    pub fn with_scheduler(
        transport: T,
        config: EngineConfig,
        scheduler: Arc<dyn SchedulerHook>,
    ) -> Self {
        let pool = SlotPool::new(config.slot_count, config.slot_size);
        let data = ModemData::new(config.content_capacity);
        Self {
            config,
            transport: Mutex::new(transport),
            session: StdMutex::new(Session {
                current: None,
                content_active: false,
                assembler: ContentAssembler::new(),
            }),
            exec_lock: Mutex::new(()),
            http_lock: Mutex::new(()),
            pool,
            data,
            scheduler,
        }
    }

    /// Values parsed out of past responses.
    pub fn data(&self) -> &ModemData {
        &self.data
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Send one command and wait for its terminal verdict.
    ///
    /// Holds the execution lock for the whole exchange. After the lock is
    /// acquired a settle delay lets any late chunks of the previous exchange
    /// drain before the new frame goes out.
    pub async fn execute(&self, command: &Command) -> Result<Outcome> {
        if command.frame().is_empty() {
            return Err(Error::InvalidArgument("empty command frame".into()));
        }

        let _exec = timeout(self.config.lock_timeout, self.exec_lock.lock())
            .await
            .map_err(|_| Error::LockTimeout(self.config.lock_timeout.as_millis() as u64))?;

        if !self.config.settle_delay.is_zero() {
            sleep(self.config.settle_delay).await;
        }

        let _priority = PriorityGuard::raise(self.scheduler.as_ref());

        // A fresh notify per dispatch: a signal left over from a previous
        // command can never wake this one.
        let done = Arc::new(Notify::new());
        {
            let mut session = self.lock_session();
            session.current = Some(InFlight {
                kind: command.kind(),
                outcome: None,
                done: Arc::clone(&done),
            });
            session.content_active = false;
            if command.kind() == CommandKind::HttpRequest {
                session.assembler.reset();
            }
        }

        debug!(command = command.kind().label(), "dispatching");
        let sent = {
            let mut transport = self.transport.lock().await;
            transport.send(command.frame()).await
        };
        if let Err(e) = sent {
            self.lock_session().current = None;
            error!(command = command.kind().label(), %e, "transmit failed");
            return Err(Error::SendFailed(e.to_string()));
        }

        let deadline = Instant::now() + command.timeout() + self.config.response_grace;
        let outcome = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break None;
            }
            let wait = remaining.min(self.config.poll_subwait);
            if timeout(wait, done.notified()).await.is_ok() {
                let session = self.lock_session();
                let verdict = session.current.as_ref().and_then(|c| c.outcome);
                if let Some(v) = verdict {
                    if v.is_terminal() {
                        break Some(v);
                    }
                }
            }
            trace!(command = command.kind().label(), "still waiting for verdict");
        };

        self.lock_session().current = None;

        match outcome {
            Some(v) => {
                info!(command = command.kind().label(), outcome = ?v, "command complete");
                Ok(v)
            }
            None => {
                warn!(command = command.kind().label(), "no terminal response before deadline");
                Err(Error::ResponseTimeout {
                    command: command.kind().label().to_string(),
                    elapsed_ms: (command.timeout() + self.config.response_grace).as_millis() as u64,
                })
            }
        }
    }

    /// Evaluate one inbound chunk against the command in flight.
    ///
    /// Chunks arriving with nothing in flight are unsolicited and dropped.
    /// The first terminal verdict decides the dispatch: once it is stored,
    /// further chunks are dropped until the dispatcher clears the session,
    /// so a trailing line cannot overwrite a decided command.
    pub fn process_chunk(&self, raw: &[u8]) {
        let text = String::from_utf8_lossy(raw);
        let mut session = self.lock_session();
        let Some(current) = session.current.as_ref() else {
            debug!(chunk = %text, "unsolicited chunk dropped");
            return;
        };
        if current.outcome.is_some() {
            debug!(chunk = %text, "chunk after terminal verdict dropped");
            return;
        }
        let kind = current.kind;
        let done = Arc::clone(&current.done);

        let verdict = evaluate(kind, raw, &text, &mut session, &self.data);
        trace!(command = kind.label(), verdict = ?verdict, "chunk evaluated");
        if !verdict.is_terminal() {
            return;
        }

        if let Some(current) = session.current.as_mut() {
            current.outcome = Some(verdict);
        }
        drop(session);
        done.notify_one();
    }

    /// Drive the receive path: stage each transport chunk through the slot
    /// pool, then evaluate it.
    ///
    /// Runs until the transport side of the channel closes.
    pub async fn run_receiver(self: Arc<Self>, mut chunks: mpsc::Receiver<Bytes>) {
        let slot_wait = Duration::from_millis(hydrolink_core::constants::POLL_SUBWAIT_MS);
        while let Some(chunk) = chunks.recv().await {
            let index = match self.pool.acquire_for_write(slot_wait).await {
                Ok(index) => index,
                Err(e) => {
                    // Both slots stuck in processing; the chunk is lost, the
                    // next idle gap resynchronises the stream.
                    error!(%e, "no staging slot available, dropping chunk");
                    continue;
                }
            };
            if let Err(e) = self
                .pool
                .write(index, &chunk)
                .and_then(|_| self.pool.commit(index))
            {
                error!(%e, index, "staging write failed");
                self.pool.release(index);
                continue;
            }
            while let Some((ready, data)) = self.pool.acquire_ready() {
                self.process_chunk(&data);
                self.pool.release(ready);
            }
        }
        info!("transport channel closed, receiver stopping");
    }

    /// Power-cycle the module and clear all dispatch state.
    pub async fn reboot_hard(&self) -> Result<()> {
        let _exec = timeout(self.config.lock_timeout, self.exec_lock.lock())
            .await
            .map_err(|_| Error::LockTimeout(self.config.lock_timeout.as_millis() as u64))?;
        info!("hard-resetting the module");
        {
            let mut transport = self.transport.lock().await;
            transport.hard_reset().await?;
        }
        let mut session = self.lock_session();
        session.current = None;
        session.content_active = false;
        session.assembler.reset();
        drop(session);
        self.pool.reset();
        Ok(())
    }
}
