//! Error types specific to card transport

use thiserror::Error;

use crate::codec::CodecError;
use crate::nfc::Technology;

/// Transport error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection error
    #[error("Failed to connect to device")]
    Connection,

    /// Transmission error
    #[error("Failed to transmit data")]
    Transmission,

    /// Device error
    #[error("Device error")]
    Device,

    /// Driver error (with code)
    #[error("Driver error code: {0}")]
    Driver(i32),

    /// The acquired technology cannot exchange APDUs
    #[error("{0} technology offers no data exchange")]
    Unsupported(Technology),

    /// No technology is currently acquired
    #[error("No technology acquired")]
    NotConnected,

    /// The command literal could not be decoded
    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] CodecError),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Cancelled operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Other error with message
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Create a new driver error
    pub const fn driver(code: i32) -> Self {
        Self::Driver(code)
    }

    /// Whether this error ends the current scan attempt
    ///
    /// A session that cannot exchange data at all, or an attempt the caller
    /// has abandoned, will not recover by moving on to the next command.
    /// Every other error only affects the command that raised it.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unsupported(_) | Self::NotConnected | Self::Cancelled)
    }

    /// Create a general other error
    pub fn other<S: Into<String>>(message: S) -> Self {
        Self::Other(message.into())
    }
}
