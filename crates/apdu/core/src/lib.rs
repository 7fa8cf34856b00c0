//! Core traits and types for APDU (Application Protocol Data Unit) exchange
//! with contactless payment cards
//!
//! This crate provides the foundational types and traits shared by the EMV
//! reader and the platform adapters:
//!
//! - Hex and packed-BCD conversions ([`codec`])
//! - Building raw ISO/IEC 7816-4 command APDUs ([`Command`])
//! - Interpreting trailing status words ([`StatusWord`])
//! - Sending raw bytes to a card ([`CardTransport`])
//! - The boundary to the platform's near-field stack ([`NfcAdapter`])
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod codec;
pub mod command;
pub mod nfc;
pub mod response;
pub mod transport;

pub use codec::CodecError;
pub use command::{Command, ExpectedLength};
pub use nfc::{Availability, NfcAdapter, TagInfo, Technology, TechnologyRequest};
pub use response::status::StatusWord;
pub use transport::{CardTransport, TransportError};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, BytesMut, Command,
        codec::{bcd_to_digits, bytes_to_hex, hex_to_bytes},
        nfc::{Availability, NfcAdapter, TagInfo, Technology, TechnologyRequest},
        response::status::StatusWord,
        transport::{CardTransport, TransportError},
    };
}
