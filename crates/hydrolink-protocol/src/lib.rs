//! AT protocol layer for the hydrolink 4G modem engine.
//!
//! Everything in this crate is pure and I/O-free: command descriptors and
//! their wire lines, the bounds-checked command-line builder, response-line
//! scanning, and the HTTP content-chunk reassembler. The runtime half of the
//! stack (dispatcher, transport, slot pool) lives in `hydrolink-modem` and
//! drives these types.
//!
//! # Layers
//!
//! - [`command`] — the tagged command registry: every AT command the engine
//!   can issue, with its exact wire line and response timeout.
//! - [`builder`] — [`CommandBuilder`], a growable line builder that escapes
//!   quoted arguments and refuses to emit an over-long line.
//! - [`response`] — prefix scanning and typed field parsing for the
//!   responses and URCs the module produces.
//! - [`content`] — reassembly of `+MHTTPURC: "content"` chunk trains into a
//!   bounded [`ContentBuffer`].

pub mod builder;
pub mod command;
pub mod content;
pub mod response;

pub use builder::CommandBuilder;
pub use command::{Command, CommandKind, HttpMethod};
pub use content::{ContentAssembler, ContentBuffer};
pub use response::ContentHeader;
