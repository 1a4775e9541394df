//! Domain types parsed from modem responses.

use crate::error::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Verdict produced when a response chunk is evaluated against the command
/// currently in flight.
///
/// `Waiting` is the only non-terminal value: it means the chunk was consumed
/// but the command is not finished, and the dispatcher must keep waiting.
/// Every other value completes the command and unblocks the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Command completed successfully.
    Ok,
    /// Command rejected or the response could not be parsed.
    Fail,
    /// Intermediate data; keep waiting for more chunks.
    Waiting,
    /// `AT+CEREG?` reported the module is not on the network.
    NotRegistered,
    /// The module has no idle HTTP client instance (CME 651).
    NoClientIdle,
    /// Assembled content outgrew the content buffer.
    Overflow,
}

impl Outcome {
    /// True for every verdict except [`Outcome::Waiting`].
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::Waiting)
    }
}

/// EPS network registration state reported by `AT+CEREG?`.
///
/// Stat values 1 (home network) and 5 (roaming) both count as registered;
/// the appliance does not care which.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// Registered on the home network.
    Home,
    /// Registered, roaming.
    Roaming,
    /// Not registered and not currently searching.
    NotRegistered,
}

impl RegistrationStatus {
    /// Map the raw `<stat>` field of `+CEREG: <n>,<stat>`.
    ///
    /// # Errors
    ///
    /// Any stat outside {0, 1, 5} is treated as a module fault.
    pub fn from_stat(stat: u8) -> Result<Self> {
        match stat {
            1 => Ok(RegistrationStatus::Home),
            5 => Ok(RegistrationStatus::Roaming),
            0 => Ok(RegistrationStatus::NotRegistered),
            other => Err(Error::InvalidResponse(format!(
                "unexpected CEREG stat {other}"
            ))),
        }
    }

    /// Whether the module can reach the network.
    pub fn is_registered(self) -> bool {
        !matches!(self, RegistrationStatus::NotRegistered)
    }
}

/// Signal quality reported by `AT+CSQ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalQuality {
    /// Raw RSSI index, 0..=31, or 99 when unknown.
    pub rssi: u8,
    /// Raw bit error rate index, 0..=7, or 99 when unknown.
    pub ber: u8,
}

impl SignalQuality {
    /// 99 means the module could not measure the signal.
    pub fn is_known(&self) -> bool {
        self.rssi != 99
    }

    /// Received signal strength in dBm (-113 + 2 * rssi), when known.
    pub fn dbm(&self) -> Option<i16> {
        if self.is_known() && self.rssi <= 31 {
            Some(-113 + 2 * i16::from(self.rssi))
        } else {
            None
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.dbm() {
            Some(dbm) => write!(f, "{} dBm (rssi {})", dbm, self.rssi),
            None => write!(f, "unknown (rssi {})", self.rssi),
        }
    }
}

/// Module real-time clock, parsed from `+CCLK: "yy/MM/dd,hh:mm:ss±zz"`.
///
/// The zone field counts quarter hours east of UTC, so `+32` is UTC+8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModemClock {
    /// Local date and time as reported by the module.
    pub local: NaiveDateTime,
    /// Zone offset in quarter-hour steps (may be negative).
    pub zone_quarters: i8,
}

impl ModemClock {
    /// Zone offset in whole minutes.
    pub fn zone_minutes(&self) -> i32 {
        i32::from(self.zone_quarters) * 15
    }
}

impl FromStr for ModemClock {
    type Err = Error;

    /// Parse the unquoted clock payload, e.g. `24/12/23,03:18:05+32`.
    fn from_str(s: &str) -> Result<Self> {
        let sign_pos = s
            .rfind(['+', '-'])
            .ok_or_else(|| Error::InvalidResponse(format!("clock missing zone: {s}")))?;
        // The date field also contains no '+'/'-', so the zone sign is the
        // only candidate; it must sit after the seconds field.
        if sign_pos < 17 {
            return Err(Error::InvalidResponse(format!("malformed clock: {s}")));
        }
        let (stamp, zone) = s.split_at(sign_pos);
        let local = NaiveDateTime::parse_from_str(stamp, "%y/%m/%d,%H:%M:%S")
            .map_err(|e| Error::InvalidResponse(format!("clock parse failed: {e}")))?;
        let zone_quarters: i8 = zone
            .parse()
            .map_err(|_| Error::InvalidResponse(format!("bad zone field: {zone}")))?;
        Ok(ModemClock {
            local,
            zone_quarters,
        })
    }
}

impl fmt::Display for ModemClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:+03}",
            self.local.format("%y/%m/%d,%H:%M:%S"),
            self.zone_quarters
        )
    }
}
