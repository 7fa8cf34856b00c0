//! Payment field extraction from decoded card records

use emvtap_apdu_core::codec::{bcd_to_digits, bytes_to_hex};

use crate::tags;
use crate::tlv::{TlvNode, find_tlv};

/// Track 2 field separator
const TRACK2_SEPARATOR: char = 'D';

/// Fields of interest, each present only if the card yielded it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFields {
    /// Primary account number, digits only
    pub pan: Option<String>,
    /// Expiry month, two digits
    pub expiry_month: Option<String>,
    /// Expiry year, four digits
    pub expiry_year: Option<String>,
    /// Cardholder name
    pub cardholder_name: Option<String>,
}

impl PaymentFields {
    /// Whether a non-empty PAN was recovered
    pub fn has_pan(&self) -> bool {
        self.pan.as_deref().is_some_and(|pan| !pan.is_empty())
    }
}

/// Pull the payment fields out of a decoded tree
///
/// Track 2 equivalent data wins over the discrete PAN and expiry tags,
/// which only fill in what Track 2 did not provide.
pub fn extract_payment_fields(nodes: &[TlvNode]) -> PaymentFields {
    let mut fields = PaymentFields::default();

    if let Some((pan, year, month)) =
        find_tlv(nodes, tags::TRACK2_EQUIVALENT_DATA).and_then(|node| parse_track2(&node.value))
    {
        fields.pan = Some(pan);
        fields.expiry_year = Some(year);
        fields.expiry_month = Some(month);
    }

    if !fields.has_pan()
        && let Some(pan) = find_tlv(nodes, tags::PAN)
    {
        fields.pan = Some(bcd_to_digits(&bytes_to_hex(&pan.value)));
    }

    if (fields.expiry_year.is_none() || fields.expiry_month.is_none())
        && let Some((year, month)) =
            find_tlv(nodes, tags::EXPIRATION_DATE).and_then(|node| parse_expiry(&node.value))
    {
        fields.expiry_year = Some(year);
        fields.expiry_month = Some(month);
    }

    fields.cardholder_name = find_tlv(nodes, tags::CARDHOLDER_NAME).and_then(|node| parse_name(&node.value));

    fields
}

/// Split Track 2 equivalent data into PAN, expiry year and expiry month
///
/// The expiry is the `YYMM` right after the separator. Returns `None` when
/// either side of the separator is empty or the expiry is incomplete.
pub fn parse_track2(value: &[u8]) -> Option<(String, String, String)> {
    let track2 = hex::encode_upper(value);
    let track2 = track2.trim_end_matches('F');

    let mut parts = track2.split(TRACK2_SEPARATOR);
    let pan_hex = parts.next().filter(|p| !p.is_empty())?;
    let rest = parts.next().filter(|r| r.len() >= 4)?;

    Some((
        bcd_to_digits(pan_hex),
        format!("20{}", &rest[..2]),
        rest[2..4].to_string(),
    ))
}

/// Year and month of a `YYMMDD` expiration date
fn parse_expiry(value: &[u8]) -> Option<(String, String)> {
    let date = bytes_to_hex(value);
    let year = date.get(..2)?;
    let month = date.get(2..4)?;
    Some((format!("20{year}"), month.to_string()))
}

fn parse_name(value: &[u8]) -> Option<String> {
    let name = String::from_utf8_lossy(value);
    let name = name.trim_matches(|c: char| c == ' ' || c == '/' || c == '\0');
    (!name.is_empty()).then(|| name.to_string())
}
