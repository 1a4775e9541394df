//! Runtime engine for the hydrolink 4G modem.
//!
//! This crate drives the pure protocol layer over a real (or mock) byte
//! transport. The central type is [`ModemEngine`]: it owns all dispatch
//! state — there are no globals — and enforces the module's one-command-at-
//! a-time contract.
//!
//! # Architecture
//!
//! ```text
//!  caller ──execute()──► ModemEngine ──frame──► ModemTransport (UART)
//!                            ▲                        │
//!                       completion                inbound chunks
//!                         notify                      │
//!                            │                        ▼
//!                       evaluate() ◄── SlotPool ◄── run_receiver
//! ```
//!
//! Inbound chunks are staged through a two-slot [`SlotPool`] (mirroring the
//! double-buffered UART receive path of the appliance firmware), evaluated
//! against the command in flight, and terminal verdicts complete the
//! dispatch through a per-command completion notify.
//!
//! # Example
//!
//! ```no_run
//! use hydrolink_modem::{EngineConfig, ModemEngine};
//! use hydrolink_modem::mock::MockTransport;
//! use std::sync::Arc;
//!
//! # async fn demo() -> hydrolink_core::Result<()> {
//! let (transport, handle, chunks) = MockTransport::new();
//! let engine = Arc::new(ModemEngine::new(transport, EngineConfig::default()));
//! tokio::spawn(Arc::clone(&engine).run_receiver(chunks));
//!
//! handle.expect("AT\r\n", &["OK\r\n"]);
//! engine.probe().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod engine;
pub mod http;
pub mod mock;
pub mod ops;
mod response;
pub mod slots;
pub mod traits;

pub use config::EngineConfig;
pub use data::{ModemData, ModemSnapshot};
pub use engine::ModemEngine;
pub use http::{HttpConfig, HttpRequest, RetryPolicy};
pub use slots::{SlotPool, SlotState};
pub use traits::{ModemTransport, NoopScheduler, PriorityGuard, SchedulerHook};
