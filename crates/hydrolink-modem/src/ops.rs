//! High-level modem operations.
//!
//! Thin wrappers that dispatch one registry command and turn its verdict
//! into a typed result. Anything the response handler parsed is read back
//! out of the shared data store.

use crate::engine::ModemEngine;
use crate::traits::ModemTransport;
use hydrolink_core::{Error, ModemClock, Outcome, RegistrationStatus, Result, SignalQuality};
use hydrolink_protocol::Command;

/// Map a terminal verdict to `Ok(())` or the matching error.
pub(crate) fn expect_ok(outcome: Outcome, label: &'static str) -> Result<()> {
    match outcome {
        Outcome::Ok => Ok(()),
        Outcome::NotRegistered => Err(Error::NotRegistered),
        Outcome::NoClientIdle => Err(Error::NoClientIdle),
        Outcome::Overflow => Err(Error::Overflow),
        Outcome::Fail | Outcome::Waiting => Err(Error::CommandFailed(label.to_string())),
    }
}

impl<T: ModemTransport> ModemEngine<T> {
    /// Check that the module is alive and parsing commands.
    pub async fn probe(&self) -> Result<()> {
        let cmd = Command::probe();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())
    }

    /// Query network registration.
    ///
    /// Returns the parsed status even when the module is not (yet)
    /// registered; only a malformed or missing response is an error.
    pub async fn registration(&self) -> Result<RegistrationStatus> {
        let cmd = Command::registration();
        match self.execute(&cmd).await? {
            Outcome::Ok | Outcome::NotRegistered => self
                .data()
                .registration()
                .ok_or_else(|| Error::InvalidResponse("no registration status stored".into())),
            other => {
                expect_ok(other, cmd.kind().label())?;
                Err(Error::InvalidResponse("unexpected registration verdict".into()))
            }
        }
    }

    /// Read the module IMEI.
    pub async fn imei(&self) -> Result<String> {
        let cmd = Command::imei();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        self.data()
            .imei()
            .ok_or_else(|| Error::InvalidResponse("no IMEI stored".into()))
    }

    /// Read the SIM ICCID.
    pub async fn iccid(&self) -> Result<String> {
        let cmd = Command::iccid();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        self.data()
            .iccid()
            .ok_or_else(|| Error::InvalidResponse("no ICCID stored".into()))
    }

    /// Read the module real-time clock.
    pub async fn clock(&self) -> Result<ModemClock> {
        let cmd = Command::clock();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        self.data()
            .clock()
            .ok_or_else(|| Error::InvalidResponse("no clock value stored".into()))
    }

    /// Read received signal quality.
    pub async fn signal_quality(&self) -> Result<SignalQuality> {
        let cmd = Command::signal();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())?;
        self.data()
            .signal()
            .ok_or_else(|| Error::InvalidResponse("no signal value stored".into()))
    }

    /// Ask the module to reboot itself.
    pub async fn reboot_soft(&self) -> Result<()> {
        let cmd = Command::reboot_soft();
        expect_ok(self.execute(&cmd).await?, cmd.kind().label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_ok_maps_verdicts() {
        assert!(expect_ok(Outcome::Ok, "AT").is_ok());
        assert!(matches!(
            expect_ok(Outcome::NotRegistered, "CEREG"),
            Err(Error::NotRegistered)
        ));
        assert!(matches!(
            expect_ok(Outcome::NoClientIdle, "MHTTPCREATE"),
            Err(Error::NoClientIdle)
        ));
        assert!(matches!(
            expect_ok(Outcome::Overflow, "MHTTPREQUEST"),
            Err(Error::Overflow)
        ));
        assert!(matches!(
            expect_ok(Outcome::Fail, "CSQ"),
            Err(Error::CommandFailed(_))
        ));
    }
}
