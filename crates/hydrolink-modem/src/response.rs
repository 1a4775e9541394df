//! Per-command response evaluation.
//!
//! Each inbound chunk is judged against the command currently in flight.
//! The verdict is an [`Outcome`]: terminal verdicts complete the dispatch,
//! [`Outcome::Waiting`] keeps the dispatcher blocked for the next chunk.

use crate::data::ModemData;
use crate::engine::Session;
use hydrolink_core::constants::CME_NO_CLIENT_IDLE;
use hydrolink_core::{Outcome, RegistrationStatus};
use hydrolink_protocol::response::{
    self, contains_error, contains_ok, parse_cme_code, parse_clock, parse_content_marker_bytes,
    parse_http_client_id, parse_registration, parse_signal, prefix,
};
use hydrolink_protocol::CommandKind;
use tracing::{debug, error, info, trace, warn};

/// Evaluate one chunk against the in-flight command.
///
/// `chunk` is the lossy text view of `raw` used for marker matching; the
/// content path reads payload bytes from `raw` so binary content survives.
pub(crate) fn evaluate(
    kind: CommandKind,
    raw: &[u8],
    chunk: &str,
    session: &mut Session,
    data: &ModemData,
) -> Outcome {
    match kind {
        // Module quirk: a probe answered with ERROR still proves the module
        // is alive and parsing, which is all the probe asks. Both final
        // codes count as success.
        CommandKind::Probe | CommandKind::EchoOff => {
            if contains_ok(chunk) {
                Outcome::Ok
            } else if contains_error(chunk) {
                warn!(command = kind.label(), "module answered ERROR, treating as alive");
                Outcome::Ok
            } else {
                Outcome::Fail
            }
        }

        CommandKind::Registration => match response::payload_after(chunk, prefix::REGISTRATION) {
            Some(payload) => match parse_registration(payload) {
                Ok((_, stat)) => match RegistrationStatus::from_stat(stat) {
                    Ok(status) => {
                        data.set_registration(status);
                        if status.is_registered() {
                            info!(?status, "registered on the network");
                            Outcome::Ok
                        } else {
                            info!("module not registered on the network");
                            Outcome::NotRegistered
                        }
                    }
                    Err(_) => Outcome::Fail,
                },
                Err(e) => {
                    error!(%e, "CEREG payload did not parse");
                    Outcome::Fail
                }
            },
            None => Outcome::Fail,
        },

        CommandKind::Imei => {
            prefix_value(chunk, prefix::IMEI, |token| data.set_imei(token.to_string()))
        }

        CommandKind::Iccid => {
            prefix_value(chunk, prefix::ICCID, |token| data.set_iccid(token.to_string()))
        }

        CommandKind::Clock => match response::payload_after(chunk, prefix::CLOCK) {
            Some(payload) => match parse_clock(payload) {
                Ok(clock) => {
                    info!(%clock, "module clock read");
                    data.set_clock(clock);
                    Outcome::Ok
                }
                Err(e) => {
                    error!(%e, "clock payload did not parse");
                    Outcome::Fail
                }
            },
            None => Outcome::Fail,
        },

        CommandKind::Signal => match response::payload_after(chunk, prefix::SIGNAL) {
            Some(payload) => match parse_signal(payload) {
                Ok(signal) => {
                    info!(%signal, "signal quality read");
                    data.set_signal(signal);
                    Outcome::Ok
                }
                Err(e) => {
                    error!(%e, "CSQ payload did not parse");
                    Outcome::Fail
                }
            },
            None => Outcome::Fail,
        },

        // The module drops the line while rebooting; any response at all
        // means the command went through.
        CommandKind::RebootSoft => Outcome::Ok,

        CommandKind::SslAuth
        | CommandKind::HttpSsl
        | CommandKind::HttpEncoding
        | CommandKind::HttpFragment
        | CommandKind::HttpHeader
        | CommandKind::HttpBody
        | CommandKind::HttpDelete => {
            if contains_ok(chunk) {
                Outcome::Ok
            } else {
                Outcome::Fail
            }
        }

        CommandKind::HttpCreate => {
            if chunk.contains(prefix::HTTP_CREATE) {
                match parse_http_client_id(chunk) {
                    Ok(id) => {
                        info!(id, "HTTP client instance created");
                        data.set_http_client_id(id);
                        Outcome::Ok
                    }
                    Err(e) => {
                        error!(%e, "MHTTPCREATE id did not parse");
                        Outcome::Fail
                    }
                }
            } else {
                match parse_cme_code(chunk) {
                    Some(CME_NO_CLIENT_IDLE) => {
                        warn!("no idle HTTP client instance on the module");
                        Outcome::NoClientIdle
                    }
                    Some(code) => {
                        error!(code, "MHTTPCREATE rejected with CME error");
                        Outcome::Fail
                    }
                    None => Outcome::Fail,
                }
            }
        }

        CommandKind::HttpRequest => evaluate_http_request(raw, chunk, session, data),
    }
}

/// The HTTP request response is a multi-phase dialogue: the command is
/// acknowledged with a bare `OK`, then content arrives as URC chunk trains.
/// Content mode stays engaged across chunks until the reassembler reaches a
/// terminal verdict.
fn evaluate_http_request(
    raw: &[u8],
    chunk: &str,
    session: &mut Session,
    data: &ModemData,
) -> Outcome {
    let mut result = Outcome::Waiting;

    if chunk.contains(prefix::CONTENT_URC) {
        session.content_active = true;
    } else if chunk.contains(prefix::ERR_URC) || chunk.contains(prefix::CME_ERROR) {
        error!(chunk, "HTTP request failed on the module");
        result = Outcome::Fail;
    } else if contains_ok(chunk) {
        // Command acknowledgement only; the response body is still coming.
        debug!("HTTP request accepted, waiting for content");
        return Outcome::Waiting;
    } else if !session.content_active {
        trace!(chunk, "ignoring chunk outside content mode");
    }

    if session.content_active {
        let assembler = &mut session.assembler;
        let verdict = if chunk.contains(prefix::CONTENT_URC) {
            match parse_content_marker_bytes(raw) {
                Ok((header, payload)) => {
                    data.with_content(|buf| assembler.on_marker(&header, payload, buf))
                }
                Err(e) => {
                    error!(%e, "content URC header did not parse");
                    Outcome::Fail
                }
            }
        } else {
            data.with_content(|buf| assembler.on_continuation(raw, buf))
        };

        result = verdict;
        if verdict.is_terminal() {
            session.content_active = false;
        }
    }

    result
}

fn prefix_value(chunk: &str, marker: &str, store: impl FnOnce(&str)) -> Outcome {
    match response::payload_after(chunk, marker) {
        Some(payload) => match response::first_token(payload) {
            Ok(token) => {
                debug!(marker, token, "stored response value");
                store(token);
                Outcome::Ok
            }
            Err(_) => Outcome::Fail,
        },
        None => Outcome::Fail,
    }
}
