//! Response-line scanning and typed field parsing.
//!
//! The module interleaves command echoes, final result codes (`OK`,
//! `ERROR`), information responses (`+CEREG: …`) and unsolicited result
//! codes in the same byte stream, and a single transport chunk may carry
//! any mix of them. These helpers scan chunks for the markers the engine
//! cares about and parse the fields behind them. Every parse is fallible;
//! malformed modem output is an error value, never a panic.

use hydrolink_core::constants::MAX_HTTP_CLIENT_ID;
use hydrolink_core::{Error, ModemClock, Result, SignalQuality};

/// Final result code for an accepted command.
pub const OK_TERMINATOR: &str = "OK\r\n";

/// Final result code for a rejected command.
pub const ERROR_TERMINATOR: &str = "ERROR\r\n";

/// Information-response and URC prefixes.
pub mod prefix {
    pub const REGISTRATION: &str = "+CEREG: ";
    pub const IMEI: &str = "+CGSN: ";
    pub const ICCID: &str = "+MCCID: ";
    pub const CLOCK: &str = "+CCLK: ";
    pub const SIGNAL: &str = "+CSQ: ";
    pub const HTTP_CREATE: &str = "+MHTTPCREATE:";
    pub const CONTENT_URC: &str = "+MHTTPURC: \"content\"";
    pub const ERR_URC: &str = "+MHTTPURC: \"err\"";
    pub const CME_ERROR: &str = "+CME ERROR: ";
}

/// True when the chunk contains a final `OK`.
pub fn contains_ok(chunk: &str) -> bool {
    chunk.contains(OK_TERMINATOR)
}

/// True when the chunk contains a final `ERROR`.
pub fn contains_error(chunk: &str) -> bool {
    chunk.contains(ERROR_TERMINATOR)
}

/// Return the text following `marker`, if the marker occurs in the chunk.
pub fn payload_after<'a>(chunk: &'a str, marker: &str) -> Option<&'a str> {
    chunk.find(marker).map(|at| &chunk[at + marker.len()..])
}

/// First whitespace-delimited token of a payload (IMEI, ICCID).
pub fn first_token(payload: &str) -> Result<&str> {
    let token = payload.trim_start().split_whitespace().next().unwrap_or("");
    if token.is_empty() {
        return Err(Error::InvalidResponse("empty response payload".into()));
    }
    Ok(token)
}

/// Parse `<n>,<stat>` behind `+CEREG: `.
pub fn parse_registration(payload: &str) -> Result<(u8, u8)> {
    let trimmed = payload.trim_start();
    let (n, stat) = trimmed
        .split_once(',')
        .ok_or_else(|| Error::InvalidResponse(format!("malformed CEREG payload: {trimmed}")))?;
    let n: u8 = n
        .trim()
        .parse()
        .map_err(|_| Error::InvalidResponse(format!("bad CEREG n field: {n}")))?;
    let stat: u8 = leading_int(stat)?;
    Ok((n, stat))
}

/// Parse `<rssi>,<ber>` behind `+CSQ: `.
pub fn parse_signal(payload: &str) -> Result<SignalQuality> {
    let trimmed = payload.trim_start();
    let (rssi, ber) = trimmed
        .split_once(',')
        .ok_or_else(|| Error::InvalidResponse(format!("malformed CSQ payload: {trimmed}")))?;
    let rssi: u8 = rssi
        .trim()
        .parse()
        .map_err(|_| Error::InvalidResponse(format!("bad CSQ rssi field: {rssi}")))?;
    let ber: u8 = leading_int(ber)?;
    Ok(SignalQuality { rssi, ber })
}

/// Parse the quoted clock string behind `+CCLK: `.
pub fn parse_clock(payload: &str) -> Result<ModemClock> {
    let start = payload
        .find('"')
        .ok_or_else(|| Error::InvalidResponse("clock response missing quote".into()))?;
    let rest = &payload[start + 1..];
    let end = rest
        .find('"')
        .ok_or_else(|| Error::InvalidResponse("clock response missing closing quote".into()))?;
    rest[..end].parse()
}

/// Extract the CME error code if the chunk carries `+CME ERROR: <code>`.
pub fn parse_cme_code(chunk: &str) -> Option<u16> {
    let payload = payload_after(chunk, prefix::CME_ERROR)?;
    leading_int(payload).ok()
}

/// Parse the client id behind `+MHTTPCREATE:`.
///
/// # Errors
///
/// An id above [`MAX_HTTP_CLIENT_ID`] + 1 slack (the module documents 0..=3
/// but has been seen reporting 4) is treated as corrupt output.
pub fn parse_http_client_id(chunk: &str) -> Result<u8> {
    let payload = payload_after(chunk, prefix::HTTP_CREATE)
        .ok_or_else(|| Error::InvalidResponse("no MHTTPCREATE marker".into()))?;
    let id: u8 = leading_int(payload)?;
    if id > MAX_HTTP_CLIENT_ID + 1 {
        return Err(Error::InvalidResponse(format!(
            "implausible HTTP client id {id}"
        )));
    }
    Ok(id)
}

/// Parsed header fields of a `+MHTTPURC: "content"` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentHeader {
    /// HTTP client instance that produced the content.
    pub client_id: u8,
    /// Declared total content length.
    pub total: u32,
    /// Bytes delivered up to and including this chunk.
    pub cumulative: u32,
    /// Declared length of this chunk.
    pub chunk_len: u32,
}

/// Split a content URC into its header and the inline payload.
///
/// Wire format:
/// `+MHTTPURC: "content",<httpid>,<total>,<cumulative>,<chunk_len>,<data>`.
/// The payload may itself contain commas; only the first four fields are
/// structured.
pub fn parse_content_marker(chunk: &str) -> Result<(ContentHeader, &str)> {
    let (header, payload) = parse_content_marker_bytes(chunk.as_bytes())?;
    // The header region is pure ASCII, so the payload slice of a str chunk
    // never starts mid-character.
    let payload = std::str::from_utf8(payload)
        .map_err(|_| Error::InvalidResponse("content payload is not UTF-8".into()))?;
    Ok((header, payload))
}

/// Byte-level variant of [`parse_content_marker`].
///
/// The receive path works on raw transport bytes: the header fields are
/// ASCII, but the payload may carry arbitrary bytes and must reach the
/// reassembler untouched.
pub fn parse_content_marker_bytes(chunk: &[u8]) -> Result<(ContentHeader, &[u8])> {
    let marker = prefix::CONTENT_URC.as_bytes();
    let at = chunk
        .windows(marker.len())
        .position(|window| window == marker)
        .ok_or_else(|| Error::InvalidResponse("no content marker".into()))?;
    let rest = &chunk[at + marker.len()..];
    let rest = rest
        .strip_prefix(b",")
        .ok_or_else(|| Error::InvalidResponse("malformed content URC".into()))?;

    let (client_id, rest) = split_int_field::<u8>(rest)?;
    let (total, rest) = split_int_field::<u32>(rest)?;
    let (cumulative, rest) = split_int_field::<u32>(rest)?;
    let (chunk_len, payload) = split_int_field::<u32>(rest)?;

    Ok((
        ContentHeader {
            client_id,
            total,
            cumulative,
            chunk_len,
        },
        payload,
    ))
}

/// Parse the integer at the start of a payload, ignoring trailing text.
fn leading_int<T: std::str::FromStr>(payload: &str) -> Result<T> {
    let trimmed = payload.trim_start();
    let digits: &str = trimmed
        .split(|c: char| !(c.is_ascii_digit() || c == '-'))
        .next()
        .unwrap_or("");
    digits
        .parse()
        .map_err(|_| Error::InvalidResponse(format!("expected integer, got: {trimmed}")))
}

/// Split one comma-terminated ASCII integer field off the front of `bytes`.
fn split_int_field<T: std::str::FromStr>(bytes: &[u8]) -> Result<(T, &[u8])> {
    let comma = bytes
        .iter()
        .position(|&b| b == b',')
        .ok_or_else(|| Error::InvalidResponse("truncated content URC header".into()))?;
    let field = std::str::from_utf8(&bytes[..comma])
        .map_err(|_| Error::InvalidResponse("content URC header is not ASCII".into()))?;
    let value = field
        .trim()
        .parse()
        .map_err(|_| Error::InvalidResponse(format!("bad content URC field: {field}")))?;
    Ok((value, &bytes[comma + 1..]))
}
