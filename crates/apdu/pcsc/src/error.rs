//! Error types for the PC/SC adapter

use std::fmt;

use emvtap_apdu_core::{Technology, TransportError};

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    NoReadersAvailable,

    /// Reader not found
    ReaderNotFound(String),

    /// No card present in reader
    NoCard(String),

    /// No card was presented before the deadline
    Timeout,

    /// The reader cannot activate any of the requested technologies
    TechnologyUnavailable(Vec<Technology>),
}

impl fmt::Display for PcscError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pcsc(e) => write!(f, "PC/SC error: {}", e),
            Self::NoReadersAvailable => write!(f, "No readers available"),
            Self::ReaderNotFound(r) => write!(f, "Reader not found: {}", r),
            Self::NoCard(r) => write!(f, "No card present in reader: {}", r),
            Self::Timeout => write!(f, "No card presented in time"),
            Self::TechnologyUnavailable(t) => {
                write!(f, "PC/SC cannot activate any of {:?}", t)
            }
        }
    }
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::Pcsc(e) => match e {
                pcsc::Error::Timeout => Self::Timeout,
                pcsc::Error::Cancelled => Self::Cancelled,
                pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard | pcsc::Error::ResetCard => {
                    Self::Connection
                }
                pcsc::Error::NoService | pcsc::Error::ServiceStopped => Self::Device,
                other => Self::driver(other as i32),
            },
            PcscError::NoReadersAvailable => Self::Device,
            PcscError::NoCard(_) => Self::Connection,
            PcscError::Timeout => Self::Timeout,
            other => Self::other(other.to_string()),
        }
    }
}
