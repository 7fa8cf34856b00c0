//! The result of a card read

use serde::Serialize;
use serde_json::{Value, json};

use emvtap_apdu_core::TagInfo;

use crate::extract::PaymentFields;
use crate::session::SessionKind;

/// Identification data recovered from a card
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardData {
    /// Primary account number, digits only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<String>,

    /// Expiry month, two digits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_month: Option<String>,

    /// Expiry year, four digits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_year: Option<String>,

    /// Cardholder name as personalised on the card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardholder_name: Option<String>,

    /// Diagnostic payload describing the session
    pub raw: Value,
}

impl CardData {
    /// Tag information only, from a plain tag read
    pub fn from_tag(tag: &TagInfo, kind: SessionKind) -> Self {
        Self::diagnostic(json!({ "tag": tag, "technology": kind }))
    }

    /// Payment data read from the application `aid`
    pub fn from_fields(fields: PaymentFields, tag: &TagInfo, aid: &str) -> Self {
        Self {
            pan: fields.pan,
            expiry_month: fields.expiry_month,
            expiry_year: fields.expiry_year,
            cardholder_name: fields.cardholder_name,
            raw: json!({ "tag": tag, "aid": aid }),
        }
    }

    /// A card that answered but offered no payment data
    pub fn no_payment_data(tag: &TagInfo) -> Self {
        Self::diagnostic(json!({ "tag": tag, "note": "No EMV data" }))
    }

    fn diagnostic(raw: Value) -> Self {
        Self {
            pan: None,
            expiry_month: None,
            expiry_year: None,
            cardholder_name: None,
            raw,
        }
    }

    /// Whether a primary account number was recovered
    pub fn has_pan(&self) -> bool {
        self.pan.as_deref().is_some_and(|pan| !pan.is_empty())
    }

    /// The PAN with all but its last four digits hidden
    pub fn masked_pan(&self) -> Option<String> {
        self.pan.as_deref().map(mask_pan)
    }

    /// Expiry as `MM/YY`, when both parts are known
    pub fn expiry(&self) -> Option<String> {
        let month = self.expiry_month.as_deref()?;
        let year = self.expiry_year.as_deref()?;
        Some(format!("{month}/{}", year.get(2..).unwrap_or(year)))
    }

    /// The AID the data was read from, for EMV reads
    pub fn aid(&self) -> Option<&str> {
        self.raw.get("aid").and_then(Value::as_str)
    }
}

/// Replace all but the last four digits with `*`
pub fn mask_pan(pan: &str) -> String {
    let visible = pan.len().saturating_sub(4);
    pan.chars()
        .enumerate()
        .map(|(i, c)| if i < visible { '*' } else { c })
        .collect()
}
