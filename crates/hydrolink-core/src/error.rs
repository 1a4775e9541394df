use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Argument / construction errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Command line too long: {len} bytes (limit {limit})")]
    CommandTooLong { len: usize, limit: usize },

    // Dispatch errors
    #[error("Execution lock not acquired within {0} ms")]
    LockTimeout(u64),

    #[error("Failed to send command to the modem: {0}")]
    SendFailed(String),

    #[error("No terminal response for {command} within {elapsed_ms} ms")]
    ResponseTimeout { command: String, elapsed_ms: u64 },

    #[error("Command {0} rejected by the modem")]
    CommandFailed(String),

    // Modem-reported conditions
    #[error("No idle HTTP client instance on the modem (CME 651)")]
    NoClientIdle,

    #[error("Module not registered on the cellular network")]
    NotRegistered,

    // Content reassembly errors
    #[error("Assembled content exceeded the content buffer capacity")]
    Overflow,

    #[error("Malformed modem response: {0}")]
    InvalidResponse(String),

    // Transport errors
    #[error("Receive channel closed, transport is gone")]
    ChannelClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
