//! Hex and packed-BCD conversions
//!
//! Command APDUs are written as hex literals and card fields such as the PAN
//! are packed BCD with `F` filler nibbles. These helpers convert between the
//! three representations.

use bytes::Bytes;

/// Error decoding a hex literal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The literal has an odd number of hex digits
    #[error("Odd number of hex digits: {0}")]
    OddLength(usize),

    /// A character is not a hex digit
    #[error("Invalid hex character {character:?} at position {index}")]
    InvalidCharacter {
        /// The offending character
        character: char,
        /// Position in the whitespace-stripped literal
        index: usize,
    },
}

impl From<hex::FromHexError> for CodecError {
    fn from(error: hex::FromHexError) -> Self {
        match error {
            hex::FromHexError::InvalidHexCharacter { c, index } => Self::InvalidCharacter {
                character: c,
                index,
            },
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                Self::OddLength(0)
            }
        }
    }
}

/// Decode a hex literal into raw bytes
///
/// Whitespace anywhere in the literal is ignored, so `"00 A4 04 00"` and
/// `"00A40400"` decode identically. Both upper and lower case digits are
/// accepted.
pub fn hex_to_bytes(hex: &str) -> Result<Bytes, CodecError> {
    let clean: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    if clean.len() % 2 != 0 {
        return Err(CodecError::OddLength(clean.len()));
    }
    Ok(Bytes::from(hex::decode(&clean)?))
}

/// Encode bytes as lowercase hex, two digits per byte
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a packed-BCD hex string into its decimal digits
///
/// Trailing `F` filler nibbles (either case) are removed first. Each
/// remaining pair is then expanded into its high and low nibble written in
/// decimal, an unpaired final digit is kept as is, and leading zeros are
/// stripped from the result.
///
/// ```
/// use emvtap_apdu_core::codec::bcd_to_digits;
///
/// assert_eq!(bcd_to_digits("4761739900001111"), "4761739900001111");
/// assert_eq!(bcd_to_digits("12345F"), "12345");
/// ```
pub fn bcd_to_digits(hex: &str) -> String {
    let clean: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let clean = clean.trim_end_matches(['F', 'f']);

    let mut digits = String::with_capacity(clean.len());
    let mut chars = clean.chars();
    loop {
        match (chars.next(), chars.next()) {
            (Some(high), Some(low)) => {
                match (high.to_digit(16), low.to_digit(16)) {
                    (Some(high), Some(low)) => {
                        digits.push_str(&high.to_string());
                        digits.push_str(&low.to_string());
                    }
                    // Not a hex pair, carried through untouched
                    _ => {
                        digits.push(high);
                        digits.push(low);
                    }
                }
            }
            (Some(last), None) => {
                digits.push(last);
                break;
            }
            _ => break,
        }
    }

    digits.trim_start_matches('0').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_to_bytes() {
        let bytes = hex_to_bytes("00A404000E325041592E5359532E4444463031").unwrap();
        assert_eq!(bytes.len(), 19);
        assert_eq!(&bytes[..5], &[0x00, 0xA4, 0x04, 0x00, 0x0E]);
        assert_eq!(&bytes[5..], b"2PAY.SYS.DDF01");

        let spaced = hex_to_bytes("80 A8 00 00\n02 83 00 00").unwrap();
        assert_eq!(spaced.as_ref(), &[0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]);

        assert!(hex_to_bytes("").unwrap().is_empty());
    }

    #[test]
    fn test_hex_to_bytes_rejects_malformed() {
        assert_eq!(hex_to_bytes("ABC"), Err(CodecError::OddLength(3)));
        assert!(matches!(
            hex_to_bytes("0G"),
            Err(CodecError::InvalidCharacter { character: 'G', .. })
        ));
    }

    #[test]
    fn test_bytes_to_hex() {
        assert_eq!(bytes_to_hex(&[0x00, 0x0A, 0xFF, 0x5F]), "000aff5f");
        assert_eq!(bytes_to_hex(&[]), "");
    }

    #[test]
    fn test_bcd_to_digits() {
        assert_eq!(bcd_to_digits("5413330089020011"), "5413330089020011");
        // Odd-length PAN padded with a single filler nibble
        assert_eq!(bcd_to_digits("541333008902001F"), "541333008902001");
        // Filler stripping is case-insensitive and handles runs
        assert_eq!(bcd_to_digits("1234ffff"), "1234");
        // Leading zeros are stripped
        assert_eq!(bcd_to_digits("0012"), "12");
        assert_eq!(bcd_to_digits("FFFF"), "");
    }
}
