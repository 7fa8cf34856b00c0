//! [`NfcAdapter`] implementation over a PC/SC reader

use std::fmt;

use bytes::Bytes;
use emvtap_apdu_core::{NfcAdapter, TagInfo, Technology, TechnologyRequest, TransportError};
use pcsc::{Attribute, Card, Disposition, Protocols};
use tracing::{debug, info, warn};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::manager::PcscDeviceManager;
use crate::reader::PcscReader;

/// Reader pseudo-APDU returning the card UID (PC/SC part 3)
const GET_UID: [u8; 5] = [0xFF, 0xCA, 0x00, 0x00, 0x00];

/// A card held on a reader
struct ActiveCard {
    card: Card,
    reader: String,
    technology: Technology,
}

/// Near-field adapter backed by a PC/SC contactless reader
pub struct PcscNfcAdapter {
    manager: PcscDeviceManager,
    config: PcscConfig,
    active: Option<ActiveCard>,
}

impl fmt::Debug for PcscNfcAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscNfcAdapter")
            .field("config", &self.config)
            .field("reader", &self.active.as_ref().map(|a| &a.reader))
            .field("technology", &self.active.as_ref().map(|a| a.technology))
            .finish()
    }
}

impl PcscNfcAdapter {
    /// Establish a PC/SC context
    pub fn new(config: PcscConfig) -> Result<Self, PcscError> {
        Ok(Self {
            manager: PcscDeviceManager::new()?,
            config,
            active: None,
        })
    }

    /// The adapter configuration
    pub const fn config(&self) -> &PcscConfig {
        &self.config
    }

    /// The underlying device manager
    pub const fn manager(&self) -> &PcscDeviceManager {
        &self.manager
    }

    /// The reader currently holding a card, if any
    pub fn active_reader(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.reader.as_str())
    }

    /// Pick the first requested technology the presented card offers
    fn negotiate(request: &TechnologyRequest, reader: &PcscReader) -> Option<Technology> {
        let offered: &[Technology] = match reader.technology() {
            Some(Technology::NfcA) => &[Technology::NfcA],
            // ISO-DEP cards can also be addressed at the 14443-3 layer
            _ => &[Technology::IsoDep, Technology::NfcA],
        };

        request
            .technologies
            .iter()
            .copied()
            .find(|t| offered.contains(t))
    }

    fn read_uid(card: &Card) -> Vec<u8> {
        let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
        match card.transmit(&GET_UID, &mut buffer) {
            Ok(response) if response.len() >= 2 && response.ends_with(&[0x90, 0x00]) => {
                response[..response.len() - 2].to_vec()
            }
            Ok(response) => {
                debug!(len = response.len(), "Reader did not return a UID");
                Vec::new()
            }
            Err(e) => {
                debug!(error = ?e, "UID query failed");
                Vec::new()
            }
        }
    }

    fn release(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(reader = %active.reader, "Releasing card");
            if let Err((_, e)) = active.card.disconnect(Disposition::LeaveCard) {
                warn!(error = ?e, "Failed to disconnect card");
            }
        }
    }
}

impl NfcAdapter for PcscNfcAdapter {
    fn start(&mut self) -> Result<(), TransportError> {
        if !self.manager.is_valid() {
            self.manager = PcscDeviceManager::new()?;
        }
        Ok(())
    }

    fn is_supported(&self) -> Result<bool, TransportError> {
        Ok(self.manager.is_valid())
    }

    fn is_enabled(&self) -> Result<bool, TransportError> {
        match self.manager.list_readers() {
            Ok(readers) => Ok(!readers.is_empty()),
            Err(PcscError::NoReadersAvailable) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn request_technology(&mut self, request: &TechnologyRequest) -> Result<TagInfo, TransportError> {
        if !request
            .technologies
            .iter()
            .any(|t| matches!(t, Technology::IsoDep | Technology::NfcA))
        {
            return Err(PcscError::TechnologyUnavailable(request.technologies.clone()).into());
        }

        // At most one card is held at a time
        self.release();

        info!(prompt = %request.alert_message, "Waiting for card");
        let reader = self.manager.wait_for_card(&self.config, request.timeout)?;

        let Some(technology) = Self::negotiate(request, &reader) else {
            return Err(PcscError::TechnologyUnavailable(request.technologies.clone()).into());
        };

        let card = self
            .manager
            .connect(reader.name(), &self.config, Protocols::ANY)?;

        let id = Self::read_uid(&card);
        let atr = card
            .get_attribute_owned(Attribute::AtrString)
            .ok()
            .or_else(|| reader.atr().map(<[u8]>::to_vec))
            .unwrap_or_default();

        info!(reader = reader.name(), %technology, "Card activated");

        self.active = Some(ActiveCard {
            card,
            reader: reader.name().to_string(),
            technology,
        });

        Ok(TagInfo {
            technology,
            id,
            atr,
            reader: Some(reader.name().to_string()),
        })
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        let Some(active) = self.active.as_mut() else {
            return Err(TransportError::NotConnected);
        };

        let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
        match active.card.transmit(command, &mut buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e) => {
                // The card left the field; the handle is useless now
                if matches!(e, pcsc::Error::ResetCard | pcsc::Error::RemovedCard) {
                    self.active = None;
                }
                Err(PcscError::from(e).into())
            }
        }
    }

    fn cancel_technology_request(&mut self) -> Result<(), TransportError> {
        self.release();
        Ok(())
    }
}

impl Drop for PcscNfcAdapter {
    fn drop(&mut self) {
        self.release();
    }
}
