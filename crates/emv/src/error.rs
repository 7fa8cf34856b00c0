//! Error types for card reads

use emvtap_apdu_core::TransportError;
use thiserror::Error;

/// No session could be negotiated with the presented card
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Every technology in the plan was refused
    #[error("No card technology could be acquired: {last}")]
    NotAcquired {
        /// Error of the last acquisition attempt
        last: TransportError,
    },
}

/// An EMV read that cannot continue
///
/// Failures of a single application or record are recovered during
/// discovery and never surface as this error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmvError {
    /// Session negotiation failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The payment directory could not be selected
    #[error("Payment directory selection failed: {0}")]
    Directory(TransportError),

    /// The session can no longer exchange data
    #[error("Session lost: {0}")]
    Transport(#[from] TransportError),
}
