//! The EMV commands used to discover card data

use emvtap_apdu_core::{CodecError, Command, codec};

/// Directory name of the proximity payment system environment
pub const PPSE_NAME: &[u8] = b"2PAY.SYS.DDF01";

/// Highest short file identifier
pub const MAX_SFI: u8 = 31;

/// Command data of a GET PROCESSING OPTIONS without PDOL data
const EMPTY_PDOL: &[u8] = &[0x83, 0x00];

/// SELECT the proximity payment system environment
pub fn select_ppse() -> Command {
    Command::new_with_data(0x00, 0xA4, 0x04, 0x00, PPSE_NAME)
}

/// SELECT an application by AID
pub fn select_aid(aid: &[u8]) -> Command {
    Command::new_with_data(0x00, 0xA4, 0x04, 0x00, aid.to_vec())
}

/// SELECT an application by AID written as hex
pub fn select_aid_hex(aid: &str) -> Result<Command, CodecError> {
    Ok(select_aid(&codec::hex_to_bytes(aid)?))
}

/// GET PROCESSING OPTIONS with an empty PDOL
pub fn get_processing_options() -> Command {
    Command::new_with_data(0x80, 0xA8, 0x00, 0x00, EMPTY_PDOL).with_le(0x00)
}

/// READ RECORD `record` of the file with short identifier `sfi`
pub const fn read_record(record: u8, sfi: u8) -> Command {
    Command::new_with_le(0x00, 0xB2, record, ((sfi & MAX_SFI) << 3) | 0x04, 0x00)
}
