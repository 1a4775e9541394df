//! Protocol-level constants for the hydrolink modem engine.
//!
//! Timing values mirror the behaviour of the ASR160x-class Cat-1 modules the
//! appliance ships with. The dispatcher contract (one command in flight,
//! settle delay before transmission, grace window on top of every command
//! timeout) depends on these numbers; changing them changes field behaviour.
//!
//! # Usage
//!
//! ```
//! use hydrolink_core::constants::*;
//! use std::time::Duration;
//!
//! let lock_timeout = Duration::from_millis(EXECUTION_LOCK_TIMEOUT_MS);
//! assert!(MAX_URL_LEN < MAX_COMMAND_LINE_LEN);
//! ```

// ===== Dispatcher timing =====

/// How long `execute` waits for the execution lock before giving up (ms).
pub const EXECUTION_LOCK_TIMEOUT_MS: u64 = 5000;

/// Quiet period between acquiring the lock and transmitting (ms).
///
/// The module drops bytes that arrive while it is still flushing a previous
/// response; this delay lets the line settle.
pub const SETTLE_DELAY_MS: u64 = 2500;

/// Grace window added on top of every command timeout (ms).
pub const RESPONSE_GRACE_MS: u64 = 1000;

/// Sub-wait used inside the response poll loop (ms).
pub const POLL_SUBWAIT_MS: u64 = 3000;

/// Default response timeout when a command does not set its own (ms).
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 10_000;

// ===== Framing =====

/// Maximum size of one inbound chunk from the transport (bytes).
pub const RX_CHUNK_SIZE: usize = 1024;

/// Number of staging slots in the framing pool.
pub const SLOT_COUNT: usize = 2;

// ===== Command construction =====

/// Maximum accepted host/URL length for HTTP client creation (bytes).
pub const MAX_URL_LEN: usize = 128;

/// Hard limit on a single AT command line, terminator included (bytes).
pub const MAX_COMMAND_LINE_LEN: usize = 512;

/// Maximum HTTP request body accepted by `AT+MHTTPCONTENT` (bytes).
pub const MAX_BODY_LEN: usize = 4096;

// ===== HTTP client instances =====

/// Highest HTTP client instance id the module hands out.
pub const MAX_HTTP_CLIENT_ID: u8 = 3;

/// CME error code the module reports when no client instance is idle.
pub const CME_NO_CLIENT_IDLE: u16 = 651;

// ===== Content reassembly =====

/// Default capacity of the assembled-content buffer (bytes).
pub const CONTENT_BUFFER_CAPACITY: usize = 1024;
