//! The AT command registry.
//!
//! Every command the engine can send is a [`Command`] descriptor: a tagged
//! kind (which selects the response evaluation path), the exact
//! CRLF-terminated wire line, and the response timeout. Constructors
//! validate their arguments, so a descriptor that exists is a descriptor
//! that may legally go on the wire.

use crate::builder::CommandBuilder;
use hydrolink_core::constants::{
    DEFAULT_COMMAND_TIMEOUT_MS, MAX_BODY_LEN, MAX_HTTP_CLIENT_ID, MAX_URL_LEN,
};
use hydrolink_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Response timeout for HTTP configuration and lifecycle commands (ms).
const HTTP_CFG_TIMEOUT_MS: u64 = 3000;

/// Response timeout for the IMEI query (ms).
const IMEI_TIMEOUT_MS: u64 = 5000;

/// Which command is in flight; selects the response evaluation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// `AT` liveness probe.
    Probe,
    /// `AT+CEREG?` network registration query.
    Registration,
    /// `AT+CGSN=1` IMEI query.
    Imei,
    /// `AT+MCCID` SIM ICCID query.
    Iccid,
    /// `AT+CCLK?` module clock query.
    Clock,
    /// `AT+CSQ` signal quality query.
    Signal,
    /// `AT+MREBOOT` module soft reboot.
    RebootSoft,
    /// `ATE0` echo off.
    EchoOff,
    /// `AT+MSSLCFG="auth",…` SSL verification mode.
    SslAuth,
    /// `AT+MHTTPCREATE` client instance creation.
    HttpCreate,
    /// `AT+MHTTPCFG="ssl",…`.
    HttpSsl,
    /// `AT+MHTTPCFG="encoding",…`.
    HttpEncoding,
    /// `AT+MHTTPCFG="fragment",…`.
    HttpFragment,
    /// `AT+MHTTPCFG="header",…`.
    HttpHeader,
    /// `AT+MHTTPCONTENT` request body upload.
    HttpBody,
    /// `AT+MHTTPREQUEST` request execution.
    HttpRequest,
    /// `AT+MHTTPDEL` client instance deletion.
    HttpDelete,
}

impl CommandKind {
    /// Short label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            CommandKind::Probe => "AT",
            CommandKind::Registration => "CEREG",
            CommandKind::Imei => "CGSN",
            CommandKind::Iccid => "MCCID",
            CommandKind::Clock => "CCLK",
            CommandKind::Signal => "CSQ",
            CommandKind::RebootSoft => "MREBOOT",
            CommandKind::EchoOff => "ATE0",
            CommandKind::SslAuth => "MSSLCFG",
            CommandKind::HttpCreate => "MHTTPCREATE",
            CommandKind::HttpSsl => "MHTTPCFG-ssl",
            CommandKind::HttpEncoding => "MHTTPCFG-encoding",
            CommandKind::HttpFragment => "MHTTPCFG-fragment",
            CommandKind::HttpHeader => "MHTTPCFG-header",
            CommandKind::HttpBody => "MHTTPCONTENT",
            CommandKind::HttpRequest => "MHTTPREQUEST",
            CommandKind::HttpDelete => "MHTTPDEL",
        }
    }
}

/// HTTP method codes used by `AT+MHTTPREQUEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum HttpMethod {
    Get = 1,
    Post = 2,
    Put = 3,
    Delete = 4,
    Head = 5,
}

impl HttpMethod {
    /// Wire code for the `<method>` field.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// One dispatchable AT command.
#[derive(Debug, Clone)]
pub struct Command {
    kind: CommandKind,
    line: String,
    timeout: Duration,
}

impl Command {
    fn fixed(kind: CommandKind, line: &str, timeout_ms: u64) -> Self {
        Self {
            kind,
            line: line.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// Which evaluation path this command takes.
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// The full wire line, CRLF included.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Bytes to hand to the transport.
    pub fn frame(&self) -> &[u8] {
        self.line.as_bytes()
    }

    /// How long the dispatcher waits for a terminal verdict.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ===== Basic queries =====

    /// `AT` liveness probe.
    pub fn probe() -> Self {
        Self::fixed(CommandKind::Probe, "AT\r\n", DEFAULT_COMMAND_TIMEOUT_MS)
    }

    /// `AT+CEREG?` network registration query.
    pub fn registration() -> Self {
        Self::fixed(
            CommandKind::Registration,
            "AT+CEREG?\r\n",
            DEFAULT_COMMAND_TIMEOUT_MS,
        )
    }

    /// `AT+CGSN=1` IMEI query.
    pub fn imei() -> Self {
        Self::fixed(CommandKind::Imei, "AT+CGSN=1\r\n", IMEI_TIMEOUT_MS)
    }

    /// `AT+MCCID` SIM ICCID query.
    pub fn iccid() -> Self {
        Self::fixed(
            CommandKind::Iccid,
            "AT+MCCID\r\n",
            DEFAULT_COMMAND_TIMEOUT_MS,
        )
    }

    /// `AT+CCLK?` module real-time clock query.
    pub fn clock() -> Self {
        Self::fixed(CommandKind::Clock, "AT+CCLK?\r\n", DEFAULT_COMMAND_TIMEOUT_MS)
    }

    /// `AT+CSQ` signal quality query.
    pub fn signal() -> Self {
        Self::fixed(CommandKind::Signal, "AT+CSQ\r\n", DEFAULT_COMMAND_TIMEOUT_MS)
    }

    /// `AT+MREBOOT` module soft reboot.
    pub fn reboot_soft() -> Self {
        Self::fixed(
            CommandKind::RebootSoft,
            "AT+MREBOOT\r\n",
            DEFAULT_COMMAND_TIMEOUT_MS,
        )
    }

    /// `ATE0` — turn command echo off before HTTP traffic.
    pub fn echo_off() -> Self {
        Self::fixed(CommandKind::EchoOff, "ATE0\r\n", HTTP_CFG_TIMEOUT_MS)
    }

    /// `AT+MSSLCFG="auth",0,0` — no server certificate verification.
    pub fn ssl_auth_none() -> Self {
        Self::fixed(
            CommandKind::SslAuth,
            "AT+MSSLCFG=\"auth\",0,0\r\n",
            HTTP_CFG_TIMEOUT_MS,
        )
    }

    // ===== HTTP client lifecycle =====

    /// `AT+MHTTPCREATE="<url>"` — create an HTTP client instance.
    ///
    /// # Errors
    ///
    /// Rejects an empty URL or one longer than [`MAX_URL_LEN`].
    pub fn http_create(url: &str) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::InvalidArgument("empty URL".into()));
        }
        if url.len() > MAX_URL_LEN {
            return Err(Error::InvalidArgument(format!(
                "URL is {} bytes, limit {MAX_URL_LEN}",
                url.len()
            )));
        }
        let line = CommandBuilder::new("AT+MHTTPCREATE")
            .quoted_arg(url)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpCreate,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPCFG="ssl",<id>,<ssl>,<cert_verify>`.
    pub fn http_ssl(client_id: u8, enable: bool) -> Result<Self> {
        validate_client_id(client_id)?;
        let line = CommandBuilder::new("AT+MHTTPCFG")
            .quoted_arg("ssl")
            .arg(client_id)
            .arg(u8::from(enable))
            .arg(0u8)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpSsl,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPCFG="encoding",<id>,0,0` — raw ASCII in and out.
    pub fn http_encoding_raw(client_id: u8) -> Result<Self> {
        validate_client_id(client_id)?;
        let line = CommandBuilder::new("AT+MHTTPCFG")
            .quoted_arg("encoding")
            .arg(client_id)
            .arg(0u8)
            .arg(0u8)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpEncoding,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPCFG="fragment",<id>,<frag_size>,<interval>` — output flow
    /// control for received content.
    pub fn http_fragment(client_id: u8, frag_size: u16, interval_ms: u16) -> Result<Self> {
        validate_client_id(client_id)?;
        let line = CommandBuilder::new("AT+MHTTPCFG")
            .quoted_arg("fragment")
            .arg(client_id)
            .arg(frag_size)
            .arg(interval_ms)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpFragment,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPCFG="header",<id>,"<header>"`.
    pub fn http_header(client_id: u8, header: &str) -> Result<Self> {
        validate_client_id(client_id)?;
        if header.is_empty() {
            return Err(Error::InvalidArgument("empty header".into()));
        }
        let line = CommandBuilder::new("AT+MHTTPCFG")
            .quoted_arg("header")
            .arg(client_id)
            .quoted_arg(header)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpHeader,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPCONTENT=<id>,0,0,"<body>"` — upload the request body in one
    /// piece (eof = 0: input complete).
    pub fn http_body(client_id: u8, body: &str) -> Result<Self> {
        validate_client_id(client_id)?;
        if body.len() > MAX_BODY_LEN {
            return Err(Error::InvalidArgument(format!(
                "body is {} bytes, limit {MAX_BODY_LEN}",
                body.len()
            )));
        }
        let line = CommandBuilder::new("AT+MHTTPCONTENT")
            .arg(client_id)
            .arg(0u8)
            .arg(0u8)
            .quoted_arg(body)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpBody,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPREQUEST=<id>,<method>,0,"<path>"`.
    ///
    /// # Errors
    ///
    /// Rejects an empty path; the builder rejects lines over 512 bytes.
    pub fn http_request(client_id: u8, method: HttpMethod, path: &str) -> Result<Self> {
        validate_client_id(client_id)?;
        if path.is_empty() {
            return Err(Error::InvalidArgument("empty path".into()));
        }
        let line = CommandBuilder::new("AT+MHTTPREQUEST")
            .arg(client_id)
            .arg(method.code())
            .arg(0u8)
            .quoted_arg(path)
            .finish()?;
        Ok(Self {
            kind: CommandKind::HttpRequest,
            line,
            timeout: Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS),
        })
    }

    /// `AT+MHTTPDEL=<id>` — delete an HTTP client instance.
    pub fn http_delete(client_id: u8) -> Result<Self> {
        validate_client_id(client_id)?;
        let line = CommandBuilder::new("AT+MHTTPDEL").arg(client_id).finish()?;
        Ok(Self {
            kind: CommandKind::HttpDelete,
            line,
            timeout: Duration::from_millis(HTTP_CFG_TIMEOUT_MS),
        })
    }
}

fn validate_client_id(client_id: u8) -> Result<()> {
    if client_id > MAX_HTTP_CLIENT_ID {
        return Err(Error::InvalidArgument(format!(
            "HTTP client id {client_id} out of range (0..={MAX_HTTP_CLIENT_ID})"
        )));
    }
    Ok(())
}
