//! Reader representation for PC/SC devices

use emvtap_apdu_core::Technology;
use pcsc::{ReaderState, State};

/// Registered application provider identifier PC/SC part 3 uses to mark
/// contactless storage cards in the ATR historical bytes
const STORAGE_CARD_RID: [u8; 5] = [0xA0, 0x00, 0x00, 0x03, 0x06];

/// Representation of a PC/SC card reader
#[derive(Debug, Clone)]
pub struct PcscReader {
    /// Name of the reader
    name: String,

    /// Whether a card is present
    has_card: bool,

    /// Answer To Reset of the card (if present)
    atr: Option<Vec<u8>>,
}

impl PcscReader {
    /// Create a new reader
    pub const fn new(name: String, has_card: bool, atr: Option<Vec<u8>>) -> Self {
        Self {
            name,
            has_card,
            atr,
        }
    }

    /// Create a reader from a reader state
    pub(crate) fn from_reader_state(reader_state: &ReaderState) -> Self {
        let has_card = reader_state.event_state().contains(State::PRESENT)
            && !reader_state.event_state().contains(State::EMPTY);

        let atr = has_card.then(|| reader_state.atr().to_vec());

        Self {
            name: reader_state.name().to_string_lossy().into_owned(),
            has_card,
            atr,
        }
    }

    /// Get the reader name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Check if a card is present in the reader
    pub const fn has_card(&self) -> bool {
        self.has_card
    }

    /// Get the ATR of the card if present
    pub fn atr(&self) -> Option<&[u8]> {
        self.atr.as_deref()
    }

    /// The technology the present card is reachable through
    ///
    /// Contactless readers synthesize the ATR. Storage cards carry the
    /// PC/SC storage RID in their historical bytes and only answer
    /// reader pseudo-APDUs; anything else is an ISO-DEP card.
    pub fn technology(&self) -> Option<Technology> {
        let atr = self.atr.as_deref()?;
        let is_storage_card = atr
            .windows(STORAGE_CARD_RID.len())
            .any(|window| window == STORAGE_CARD_RID);

        Some(if is_storage_card {
            Technology::NfcA
        } else {
            Technology::IsoDep
        })
    }
}
