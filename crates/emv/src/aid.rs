//! Payment application identifiers

use crate::tags;
use crate::tlv::{TlvNode, find_all, parse_tlv_with_depth};

/// Visa credit or debit
pub const VISA: &str = "A0000000031010";
/// Mastercard credit or debit
pub const MASTERCARD: &str = "A0000000041010";
/// American Express
pub const AMERICAN_EXPRESS: &str = "A00000002501";
/// Visa Electron
pub const VISA_ELECTRON: &str = "A0000000032010";

/// Scheme AIDs tried when the card exposes no payment directory
pub const DEFAULT_FALLBACK_AIDS: [&str; 4] = [VISA, MASTERCARD, AMERICAN_EXPRESS, VISA_ELECTRON];

/// Registered application provider prefixes of the common schemes
const SCHEMES: [(&str, &str); 9] = [
    ("A000000003", "Visa"),
    ("A000000004", "Mastercard"),
    ("A000000025", "American Express"),
    ("A000000065", "JCB"),
    ("A000000152", "Discover"),
    ("A000000324", "Discover"),
    ("A000000333", "UnionPay"),
    ("A000000277", "Interac"),
    ("A000000658", "Mir"),
];

/// Application identifiers listed in a directory response
///
/// Every tag `4F` anywhere in the tree is collected as uppercase hex, in
/// depth-first order with duplicates removed.
pub fn extract_aids(nodes: &[TlvNode]) -> Vec<String> {
    let mut aids: Vec<String> = Vec::new();
    for node in find_all(nodes, tags::APPLICATION_IDENTIFIER) {
        let aid = hex::encode_upper(&node.value);
        if !aids.contains(&aid) {
            aids.push(aid);
        }
    }
    aids
}

/// The AIDs to try, in order, given the PPSE response
///
/// Falls back to `fallback` when the directory lists nothing.
pub fn candidate_aids(ppse_response: &[u8], fallback: &[String], max_depth: usize) -> Vec<String> {
    let aids = extract_aids(&parse_tlv_with_depth(ppse_response, max_depth));
    if aids.is_empty() {
        fallback.to_vec()
    } else {
        aids
    }
}

/// Scheme name for an AID, if it belongs to a known provider
pub fn scheme_name(aid: &str) -> Option<&'static str> {
    let aid = aid.to_ascii_uppercase();
    SCHEMES
        .iter()
        .find(|(prefix, _)| aid.starts_with(prefix))
        .map(|(_, name)| *name)
}
