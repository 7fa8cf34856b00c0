//! Boundary to the platform's near-field stack
//!
//! The radio, anticollision and technology activation all live below this
//! trait. An adapter only has to grant or refuse a technology, exchange
//! bytes over it, and release it again.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use derive_more::Display;
use serde::{Serialize, Serializer};

use crate::transport::TransportError;

/// Default prompt shown while waiting for a card
pub const DEFAULT_ALERT_MESSAGE: &str = "Hold your card near the reader";

/// Default time to wait for a card to be presented
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Near-field technology a tag can be reached through
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Technology {
    /// NFC Data Exchange Format message access
    Ndef,
    /// ISO 14443-4, the APDU-capable layer payment cards use
    IsoDep,
    /// Base ISO 14443-3A proximity access
    NfcA,
}

impl Technology {
    /// Whether command APDUs can be exchanged over this technology
    pub const fn supports_apdu(&self) -> bool {
        matches!(self, Self::IsoDep)
    }
}

/// Whether the platform has near-field hardware and whether it is turned on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Availability {
    /// Near-field hardware is present
    pub supported: bool,
    /// Near-field hardware is switched on
    pub enabled: bool,
}

impl Availability {
    /// Whether a scan can be attempted right now
    pub const fn is_ready(&self) -> bool {
        self.supported && self.enabled
    }
}

/// A request to activate one of a set of technologies on the next tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnologyRequest {
    /// Acceptable technologies; whichever responds first wins
    pub technologies: Vec<Technology>,
    /// Prompt shown to the user while waiting
    pub alert_message: String,
    /// How long to wait for a tag
    pub timeout: Duration,
}

impl TechnologyRequest {
    /// Request any of the given technologies with default prompt and timeout
    pub fn new(technologies: impl Into<Vec<Technology>>) -> Self {
        Self {
            technologies: technologies.into(),
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the user-facing prompt
    pub fn with_alert_message(mut self, message: impl Into<String>) -> Self {
        self.alert_message = message.into();
        self
    }

    /// Set the wait timeout
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether this request accepts the given technology
    pub fn accepts(&self, technology: Technology) -> bool {
        self.technologies.contains(&technology)
    }
}

/// What the platform reports about an activated tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagInfo {
    /// Technology the tag was activated through
    pub technology: Technology,
    /// Tag identifier (UID), if the platform exposes it
    #[serde(serialize_with = "serialize_hex")]
    pub id: Vec<u8>,
    /// Answer-to-reset or historical bytes, if any
    #[serde(serialize_with = "serialize_hex")]
    pub atr: Vec<u8>,
    /// Name of the reader the tag was found on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reader: Option<String>,
}

impl TagInfo {
    /// Tag info with only the activated technology known
    pub const fn new(technology: Technology) -> Self {
        Self {
            technology,
            id: Vec::new(),
            atr: Vec::new(),
            reader: None,
        }
    }
}

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode_upper(bytes))
}

/// The platform's near-field stack
///
/// At most one technology is held at a time. Every successful
/// [`request_technology`](Self::request_technology) must be balanced by
/// [`cancel_technology_request`](Self::cancel_technology_request); calling
/// it with nothing held is harmless.
pub trait NfcAdapter: fmt::Debug {
    /// Start the platform manager
    fn start(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Whether the platform has near-field hardware
    fn is_supported(&self) -> Result<bool, TransportError>;

    /// Whether the near-field hardware is switched on
    fn is_enabled(&self) -> Result<bool, TransportError>;

    /// Open the platform's near-field settings so the user can enable it
    fn open_settings(&mut self) -> Result<(), TransportError> {
        Err(TransportError::other("Near-field settings are not available"))
    }

    /// Wait for a tag and activate one of the requested technologies on it
    fn request_technology(&mut self, request: &TechnologyRequest) -> Result<TagInfo, TransportError>;

    /// Exchange raw bytes with the activated tag
    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Release whatever technology is held
    fn cancel_technology_request(&mut self) -> Result<(), TransportError>;
}
