//! Contactless EMV card-data extraction
//!
//! This crate reads the identification data of a contactless payment card
//! (account number, expiry and cardholder name) for pre-filling a payment
//! form. It is not a payment kernel: no cryptogram, risk management or PIN
//! handling takes place.
//!
//! A read runs through these stages:
//!
//! - [`SessionNegotiator`] acquires a technology on the presented card and
//!   releases it exactly once when the attempt ends
//! - [`EmvDiscovery`] selects the payment directory and each candidate
//!   application, then reads its records
//! - [`tlv`] decodes the responses
//! - [`extract`] pulls the payment fields out of the decoded tree
//!
//! [`NfcCardService`] wraps these behind the operations an application
//! calls.
//!
//! # Examples
//!
//! ```no_run
//! use emvtap_apdu_core::NfcAdapter;
//! use emvtap_emv::NfcCardService;
//!
//! fn scan<A: NfcAdapter>(adapter: A) {
//!     let mut service = NfcCardService::new(adapter);
//!     if !service.is_supported() {
//!         return;
//!     }
//!
//!     match service.read_emv_once() {
//!         Some(card) if card.has_pan() => println!("Card {:?}", card.masked_pan()),
//!         Some(_) => println!("Card read but no payment data"),
//!         None => println!("Card not detected, try again"),
//!     }
//! }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aid;
mod card_data;
pub mod commands;
mod config;
mod discovery;
mod error;
pub mod extract;
mod service;
mod session;
pub mod tags;
pub mod tlv;

pub use card_data::{CardData, mask_pan};
pub use config::ScanConfig;
pub use discovery::{ApplicationMatch, DiscoveryOutcome, EmvDiscovery};
pub use error::{EmvError, SessionError};
pub use extract::{PaymentFields, extract_payment_fields};
pub use service::{EmvRead, NfcCardService};
pub use session::{EMV_PLAN, Session, SessionKind, SessionNegotiator, TAG_PLAN};
pub use tlv::{TlvNode, find_tlv, parse_tlv};
