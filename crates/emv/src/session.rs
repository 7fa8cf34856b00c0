//! Session negotiation with the presented card
//!
//! A negotiator walks an ordered plan of technology requests and keeps the
//! first one the platform grants. The adapter is released exactly once
//! when the attempt ends, whether a session was obtained or not, through a
//! guard that owns the adapter borrow for the whole attempt.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use emvtap_apdu_core::nfc::{DEFAULT_ALERT_MESSAGE, DEFAULT_TIMEOUT};
use emvtap_apdu_core::{CardTransport, NfcAdapter, TagInfo, Technology, TechnologyRequest, TransportError};
use serde::Serialize;
use tracing::debug;

use crate::error::SessionError;

/// How a session was acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionKind {
    /// NDEF message access
    Ndef,
    /// ISO-DEP, APDU capable
    IsoDep,
    /// Whichever of the broad technology set answered first
    Generic,
}

impl SessionKind {
    /// Technologies requested for this kind of session
    pub const fn technologies(&self) -> &'static [Technology] {
        match self {
            Self::Ndef => &[Technology::Ndef],
            Self::IsoDep => &[Technology::IsoDep],
            Self::Generic => &[Technology::Ndef, Technology::IsoDep, Technology::NfcA],
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ndef => write!(f, "Ndef"),
            Self::IsoDep => write!(f, "IsoDep"),
            Self::Generic => write!(f, "Generic"),
        }
    }
}

/// Plan for plain tag reads
pub const TAG_PLAN: [SessionKind; 3] = [SessionKind::Ndef, SessionKind::IsoDep, SessionKind::Generic];

/// Plan for EMV reads; NDEF cannot carry APDUs so it is not tried
pub const EMV_PLAN: [SessionKind; 2] = [SessionKind::IsoDep, SessionKind::Generic];

/// Releases the adapter's technology when dropped
#[derive(Debug)]
struct ReleaseGuard<'a, A: NfcAdapter + ?Sized> {
    adapter: &'a mut A,
}

impl<A: NfcAdapter + ?Sized> Drop for ReleaseGuard<'_, A> {
    fn drop(&mut self) {
        match self.adapter.cancel_technology_request() {
            Ok(()) => debug!("Technology released"),
            Err(e) => debug!(error = ?e, "Technology release failed"),
        }
    }
}

/// Negotiates one session for one scan attempt
#[derive(Debug)]
pub struct SessionNegotiator<'a, A: NfcAdapter + ?Sized> {
    adapter: &'a mut A,
    alert_message: String,
    timeout: Duration,
}

impl<'a, A: NfcAdapter + ?Sized> SessionNegotiator<'a, A> {
    /// Create a negotiator with the default prompt and timeout
    pub fn new(adapter: &'a mut A) -> Self {
        Self {
            adapter,
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the user-facing prompt
    pub fn with_alert_message(mut self, message: impl Into<String>) -> Self {
        self.alert_message = message.into();
        self
    }

    /// Set how long each acquisition waits for a card
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Acquire a session for reading tag information
    pub fn acquire_for_tag(self) -> Result<Session<'a, A>, SessionError> {
        self.acquire(&TAG_PLAN)
    }

    /// Acquire a session for an EMV exchange
    pub fn acquire_for_emv(self) -> Result<Session<'a, A>, SessionError> {
        self.acquire(&EMV_PLAN)
    }

    /// Try each kind of session in order and keep the first one granted
    pub fn acquire(self, plan: &[SessionKind]) -> Result<Session<'a, A>, SessionError> {
        let mut guard = ReleaseGuard {
            adapter: self.adapter,
        };
        let mut last = TransportError::NotConnected;

        for &kind in plan {
            let request = TechnologyRequest::new(kind.technologies())
                .with_alert_message(self.alert_message.clone())
                .with_timeout(self.timeout);

            match guard.adapter.request_technology(&request) {
                Ok(tag) => {
                    debug!(%kind, technology = %tag.technology, "Session acquired");
                    return Ok(Session { guard, kind, tag });
                }
                Err(e) => {
                    debug!(%kind, error = %e, "Technology not acquired");
                    last = e;
                }
            }
        }

        // The guard drops here and releases
        Err(SessionError::NotAcquired { last })
    }
}

/// An acquired session, released when dropped
#[derive(Debug)]
pub struct Session<'a, A: NfcAdapter + ?Sized> {
    guard: ReleaseGuard<'a, A>,
    kind: SessionKind,
    tag: TagInfo,
}

impl<A: NfcAdapter + ?Sized> Session<'_, A> {
    /// How the session was acquired
    pub const fn kind(&self) -> SessionKind {
        self.kind
    }

    /// What the platform reported about the tag
    pub const fn tag(&self) -> &TagInfo {
        &self.tag
    }

    /// Technology actually activated on the tag
    pub const fn technology(&self) -> Technology {
        self.tag.technology
    }

    /// End the session now
    pub fn release(self) {}
}

impl<A: NfcAdapter + ?Sized> CardTransport for Session<'_, A> {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if !self.tag.technology.supports_apdu() {
            return Err(TransportError::Unsupported(self.tag.technology));
        }
        self.guard.adapter.transceive(command)
    }

    fn is_connected(&self) -> bool {
        self.tag.technology.supports_apdu()
    }
}
