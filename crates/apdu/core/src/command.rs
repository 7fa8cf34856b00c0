//! APDU command definitions
//!
//! This module provides a short-form ISO/IEC 7816-4 command APDU builder.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};


/// Expected length type for APDU commands
pub type ExpectedLength = u8;

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<ExpectedLength>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: ExpectedLength) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// Set the data field
    pub fn with_data<T: Into<Bytes>>(mut self, data: T) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: ExpectedLength) -> Self {
        self.le = Some(le);
        self
    }

    /// Calculate length of serialized command
    pub fn command_length(&self) -> usize {
        // Header (CLA, INS, P1, P2) is always 4 bytes
        let mut length = 4;
        if let Some(data) = &self.data {
            length += 1 + data.len();
        }
        if self.le.is_some() {
            length += 1;
        }
        length
    }

    /// Convert to raw APDU bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        // Lc and data; short form only, so data is capped at 255 bytes
        if let Some(data) = &self.data {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }

    /// Parse a command from raw bytes
    ///
    /// A short command is padded with zero header bytes. Anything after the
    /// header that does not fit the short-form layout is kept as data.
    pub fn from_bytes(data: &[u8]) -> Self {
        let header = |i: usize| data.get(i).copied().unwrap_or_default();
        let mut command = Self::new(header(0), header(1), header(2), header(3));

        if data.len() > 4 {
            let lc = data[4] as usize;
            if data.len() == 5 {
                command.le = Some(data[4]);
            } else if data.len() == 5 + lc {
                command.data = Some(Bytes::copy_from_slice(&data[5..]));
            } else if data.len() == 6 + lc {
                command.data = Some(Bytes::copy_from_slice(&data[5..5 + lc]));
                command.le = Some(data[5 + lc]);
            } else {
                command.data = Some(Bytes::copy_from_slice(&data[5..]));
            }
        }

        command
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_serialization() {
        let data = Bytes::from_static(&[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]);
        let cmd = Command::new_with_data(0x00, 0xA4, 0x04, 0x00, data);
        let bytes = cmd.to_bytes();

        assert_eq!(bytes[0], 0x00); // CLA
        assert_eq!(bytes[1], 0xA4); // INS
        assert_eq!(bytes[2], 0x04); // P1
        assert_eq!(bytes[3], 0x00); // P2
        assert_eq!(bytes[4], 0x07); // Lc (data length)
        assert_eq!(&bytes[5..], &[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]);
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn test_command_length() {
        let cmd1 = Command::new(0x00, 0xB2, 0x01, 0x0C);
        assert_eq!(cmd1.command_length(), 4);

        let cmd2 = Command::new_with_le(0x00, 0xB2, 0x01, 0x0C, 0x00);
        assert_eq!(cmd2.command_length(), 5);

        let data = Bytes::from_static(&[0x83, 0x00]);
        let cmd3 = Command::new_with_data(0x80, 0xA8, 0x00, 0x00, data.clone());
        assert_eq!(cmd3.command_length(), 7);

        let cmd4 = cmd3.with_le(0x00);
        assert_eq!(cmd4.command_length(), 8);
        assert_eq!(cmd4.to_bytes().len(), 8);
    }

    #[test]
    fn test_command_from_bytes() {
        let cmd = Command::from_bytes(&[0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]);
        assert_eq!(cmd.cla, 0x80);
        assert_eq!(cmd.ins, 0xA8);
        assert_eq!(cmd.data.as_deref(), Some(&[0x83, 0x00][..]));
        assert_eq!(cmd.le, Some(0x00));
        assert_eq!(cmd.to_string(), "80A8000002830000");

        // Read record: header plus Le only
        let cmd = Command::from_bytes(&[0x00, 0xB2, 0x01, 0x0C, 0x00]);
        assert!(cmd.data.is_none());
        assert_eq!(cmd.le, Some(0x00));

        // Select without Le
        let select = [0x00, 0xA4, 0x04, 0x00, 0x07, 0xA0, 0x00, 0x00, 0x00, 0x04, 0x10, 0x10];
        let cmd = Command::from_bytes(&select);
        assert_eq!(cmd.data.as_ref().map(|d| d.len()), Some(7));
        assert!(cmd.le.is_none());
        assert_eq!(cmd.to_bytes().as_ref(), &select[..]);

        // Header only, or less
        assert_eq!(Command::from_bytes(&[0x00, 0xCA]), Command::new(0x00, 0xCA, 0x00, 0x00));
    }
}
