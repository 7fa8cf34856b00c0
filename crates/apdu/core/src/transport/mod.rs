//! Transport traits for APDU communication with cards
//!
//! This module provides the byte-in/byte-out abstraction every APDU
//! exchange goes through, whatever technology carries it.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

use crate::codec;
use crate::command::Command;

/// Trait for basic card transports
///
/// A transport is responsible for sending and receiving raw APDU bytes.
/// It has no knowledge of command structure or protocol details, and
/// returns responses unmodified, trailing status word included.
pub trait CardTransport: fmt::Debug {
    /// Send raw APDU bytes to card and return response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode_upper(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Send a command given as a hex literal
    fn transceive(&mut self, command_hex: &str) -> Result<Bytes, TransportError> {
        let command = codec::hex_to_bytes(command_hex)?;
        self.transmit_raw(&command)
    }

    /// Serialize and send a command
    fn transmit_command(&mut self, command: &Command) -> Result<Bytes, TransportError> {
        self.transmit_raw(&command.to_bytes())
    }

    /// Check if the transport is connected to a physical card
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct MockTransport {
    /// Mock responses to return
    pub(crate) responses: Vec<Bytes>,
    /// Commands that were sent
    pub(crate) commands: Vec<Bytes>,
    /// Whether the transport is connected
    pub(crate) connected: bool,
}

#[cfg(test)]
impl MockTransport {
    /// Create a new mock transport with the given responses
    pub(crate) fn new(responses: Vec<Bytes>) -> Self {
        Self {
            responses,
            commands: Vec::new(),
            connected: true,
        }
    }
}

#[cfg(test)]
impl CardTransport for MockTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }

        self.commands.push(Bytes::copy_from_slice(command));

        if self.responses.is_empty() {
            return Err(TransportError::Transmission);
        }
        Ok(self.responses.remove(0))
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
