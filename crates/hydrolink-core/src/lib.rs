//! Core types for the hydrolink 4G modem engine.
//!
//! This crate holds the pieces shared by every layer of the modem stack:
//! the error taxonomy, the response [`Outcome`] verdict, protocol-level
//! constants, and small domain types parsed out of modem responses
//! (registration status, signal quality, the module real-time clock).
//!
//! Nothing in this crate performs I/O; it is the vocabulary the protocol
//! and engine crates speak to each other in.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
