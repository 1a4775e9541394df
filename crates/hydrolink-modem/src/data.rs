//! Shared modem data store.
//!
//! Response handlers write parsed values here; application code reads
//! snapshots. One mutex-guarded struct replaces scattered globals, and the
//! HTTP content buffer lives here too because it outlives any single
//! command dispatch.

use bytes::Bytes;
use hydrolink_core::{ModemClock, RegistrationStatus, SignalQuality};
use hydrolink_protocol::ContentBuffer;
use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug)]
struct Inner {
    imei: Option<String>,
    iccid: Option<String>,
    registration: Option<RegistrationStatus>,
    signal: Option<SignalQuality>,
    clock: Option<ModemClock>,
    http_client_id: Option<u8>,
    content: ContentBuffer,
}

/// Mutex-guarded store for values parsed out of modem responses.
#[derive(Debug)]
pub struct ModemData {
    inner: Mutex<Inner>,
}

/// Read-only copy of the store, minus the content buffer.
#[derive(Debug, Clone, Serialize)]
pub struct ModemSnapshot {
    pub imei: Option<String>,
    pub iccid: Option<String>,
    pub registration: Option<RegistrationStatus>,
    pub signal: Option<SignalQuality>,
    pub clock: Option<ModemClock>,
    pub http_client_id: Option<u8>,
    pub content_len: usize,
}

impl ModemData {
    /// Create a store whose content buffer holds up to `content_capacity`
    /// bytes.
    pub fn new(content_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                imei: None,
                iccid: None,
                registration: None,
                signal: None,
                clock: None,
                http_client_id: None,
                content: ContentBuffer::new(content_capacity),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ModemSnapshot {
        let inner = self.lock();
        ModemSnapshot {
            imei: inner.imei.clone(),
            iccid: inner.iccid.clone(),
            registration: inner.registration,
            signal: inner.signal,
            clock: inner.clock,
            http_client_id: inner.http_client_id,
            content_len: inner.content.len(),
        }
    }

    pub fn imei(&self) -> Option<String> {
        self.lock().imei.clone()
    }

    pub fn iccid(&self) -> Option<String> {
        self.lock().iccid.clone()
    }

    pub fn registration(&self) -> Option<RegistrationStatus> {
        self.lock().registration
    }

    pub fn signal(&self) -> Option<SignalQuality> {
        self.lock().signal
    }

    pub fn clock(&self) -> Option<ModemClock> {
        self.lock().clock
    }

    pub fn http_client_id(&self) -> Option<u8> {
        self.lock().http_client_id
    }

    pub(crate) fn set_imei(&self, imei: String) {
        self.lock().imei = Some(imei);
    }

    pub(crate) fn set_iccid(&self, iccid: String) {
        self.lock().iccid = Some(iccid);
    }

    pub(crate) fn set_registration(&self, status: RegistrationStatus) {
        self.lock().registration = Some(status);
    }

    pub(crate) fn set_signal(&self, signal: SignalQuality) {
        self.lock().signal = Some(signal);
    }

    pub(crate) fn set_clock(&self, clock: ModemClock) {
        self.lock().clock = Some(clock);
    }

    pub(crate) fn set_http_client_id(&self, id: u8) {
        self.lock().http_client_id = Some(id);
    }

    /// Run `f` against the content buffer under the store lock.
    pub(crate) fn with_content<R>(&self, f: impl FnOnce(&mut ContentBuffer) -> R) -> R {
        f(&mut self.lock().content)
    }

    /// Move the assembled HTTP content out of the store.
    pub fn take_content(&self) -> Bytes {
        self.lock().content.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_setters() {
        let data = ModemData::new(64);
        data.set_imei("862991234567890".into());
        data.set_http_client_id(2);
        data.set_registration(RegistrationStatus::Home);

        let snap = data.snapshot();
        assert_eq!(snap.imei.as_deref(), Some("862991234567890"));
        assert_eq!(snap.http_client_id, Some(2));
        assert_eq!(snap.registration, Some(RegistrationStatus::Home));
        assert_eq!(snap.content_len, 0);
    }

    #[test]
    fn content_take_empties_the_buffer() {
        let data = ModemData::new(64);
        data.with_content(|buf| buf.append(b"body").unwrap());
        assert_eq!(data.snapshot().content_len, 4);
        assert_eq!(&data.take_content()[..], b"body");
        assert_eq!(data.snapshot().content_len, 0);
    }
}
