//! PC/SC contactless reader adapter
//!
//! This crate implements the [`NfcAdapter`](emvtap_apdu_core::NfcAdapter)
//! boundary on top of a PC/SC reader, so that a contactless card laid on a
//! desktop reader can be scanned the same way a phone scans one.
//!
//! PC/SC only exposes the ISO 14443-4 (ISO-DEP) layer and, on most
//! readers, storage cards through pseudo-APDUs. NDEF access is not
//! available, so requests for NDEF alone are refused and the session
//! negotiator falls through to ISO-DEP.
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emvtap_apdu_core::{NfcAdapter, Technology, TechnologyRequest};
//! use emvtap_nfc_pcsc::{PcscConfig, PcscNfcAdapter};
//!
//! let mut adapter = PcscNfcAdapter::new(PcscConfig::default())?;
//!
//! let tag = adapter.request_technology(&TechnologyRequest::new([Technology::IsoDep]))?;
//! println!("Card on {:?}", tag.reader);
//!
//! let response = adapter.transceive(b"\x00\xA4\x04\x00\x0E2PAY.SYS.DDF01")?;
//! println!("Response: {:02X?}", response.as_ref());
//!
//! adapter.cancel_technology_request()?;
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod adapter;
mod config;
mod error;
mod manager;
mod reader;

pub use adapter::PcscNfcAdapter;
pub use config::{PcscConfig, ShareMode};
pub use error::PcscError;
pub use manager::PcscDeviceManager;
pub use reader::PcscReader;
