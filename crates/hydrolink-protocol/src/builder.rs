//! Bounds-checked AT command line construction.
//!
//! The module accepts command lines up to 512 bytes. Fixed-size buffers with
//! silent truncation are exactly how half-built commands end up on the wire,
//! so the builder grows freely and validates the final length once: an
//! over-long line is a typed error, never a truncated transmission.

use hydrolink_core::constants::MAX_COMMAND_LINE_LEN;
use hydrolink_core::{Error, Result};

/// Growable builder for one AT command line.
///
/// Arguments are appended with `=` before the first and `,` before each
/// subsequent one; string arguments are double-quoted with embedded quotes
/// escaped. [`CommandBuilder::finish`] appends the `\r\n` terminator and
/// enforces the line limit.
///
/// # Examples
///
/// ```
/// use hydrolink_protocol::CommandBuilder;
///
/// let line = CommandBuilder::new("AT+MHTTPCFG")
///     .quoted_arg("ssl")
///     .arg(0u8)
///     .arg(1u8)
///     .arg(0u8)
///     .finish()
///     .unwrap();
/// assert_eq!(line, "AT+MHTTPCFG=\"ssl\",0,1,0\r\n");
/// ```
#[derive(Debug)]
pub struct CommandBuilder {
    line: String,
    has_args: bool,
}

impl CommandBuilder {
    /// Start a line with the command verb, e.g. `AT+MHTTPCREATE`.
    pub fn new(verb: &str) -> Self {
        Self {
            line: verb.to_string(),
            has_args: false,
        }
    }

    fn separator(&mut self) {
        if self.has_args {
            self.line.push(',');
        } else {
            self.line.push('=');
            self.has_args = true;
        }
    }

    /// Append an unquoted argument (numbers, flags).
    pub fn arg(mut self, value: impl std::fmt::Display) -> Self {
        self.separator();
        self.line.push_str(&value.to_string());
        self
    }

    /// Append a double-quoted string argument, escaping embedded `"`.
    pub fn quoted_arg(mut self, value: &str) -> Self {
        self.separator();
        self.line.push('"');
        for c in value.chars() {
            if c == '"' {
                self.line.push('\\');
            }
            self.line.push(c);
        }
        self.line.push('"');
        self
    }

    /// Terminate the line and validate its length.
    ///
    /// # Errors
    ///
    /// [`Error::CommandTooLong`] when the terminated line exceeds
    /// [`MAX_COMMAND_LINE_LEN`].
    pub fn finish(mut self) -> Result<String> {
        self.line.push_str("\r\n");
        if self.line.len() > MAX_COMMAND_LINE_LEN {
            return Err(Error::CommandTooLong {
                len: self.line.len(),
                limit: MAX_COMMAND_LINE_LEN,
            });
        }
        Ok(self.line)
    }
}
