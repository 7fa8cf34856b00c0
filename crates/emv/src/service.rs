//! The card reading service offered to applications
//!
//! Every operation reports failure as a plain value. Availability problems
//! come back as an [`Availability`], and a scan that could not produce a
//! result comes back as `None`. The caller decides whether to retry.

use std::time::Duration;

use emvtap_apdu_core::{Availability, NfcAdapter, TagInfo};
use tracing::{debug, info, warn};

use crate::card_data::CardData;
use crate::config::ScanConfig;
use crate::discovery::{DiscoveryOutcome, EmvDiscovery};
use crate::error::EmvError;
use crate::session::SessionNegotiator;
use crate::tlv::TlvNode;

/// A completed EMV read with the decoded data behind it
#[derive(Debug, Clone, PartialEq)]
pub struct EmvRead {
    /// The extracted card data
    pub card: CardData,
    /// Decoded GPO and record data of the matching application
    pub nodes: Vec<TlvNode>,
    /// Technology the card was read through
    pub tag: TagInfo,
}

/// Reads contactless cards through a platform adapter
#[derive(Debug)]
pub struct NfcCardService<A: NfcAdapter> {
    adapter: A,
    config: ScanConfig,
}

impl<A: NfcAdapter> NfcCardService<A> {
    /// Create a service with the default scan configuration
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, ScanConfig::default())
    }

    /// Create a service with the given scan configuration
    pub const fn with_config(adapter: A, config: ScanConfig) -> Self {
        Self { adapter, config }
    }

    /// The scan configuration
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The platform adapter
    pub const fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Mutable access to the platform adapter
    pub const fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Consume the service, returning the adapter
    pub fn into_inner(self) -> A {
        self.adapter
    }

    /// Start the platform's near-field manager
    ///
    /// Returns `false` when the platform has no near-field support or the
    /// manager cannot be started.
    pub fn init(&mut self) -> bool {
        match self.adapter.is_supported() {
            Ok(true) => {}
            Ok(false) => {
                info!("Near-field hardware not supported");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "Could not query near-field support");
                return false;
            }
        }

        match self.adapter.start() {
            Ok(()) => {
                debug!("Near-field manager started");
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not start near-field manager");
                false
            }
        }
    }

    /// Whether near-field hardware is present and switched on
    pub fn is_supported(&self) -> bool {
        self.check_availability().is_ready()
    }

    /// Whether near-field hardware is present, and whether it is on
    ///
    /// Any platform error reads as neither.
    pub fn check_availability(&self) -> Availability {
        let availability = (|| {
            let supported = self.adapter.is_supported()?;
            let enabled = supported && self.adapter.is_enabled()?;
            Ok::<_, emvtap_apdu_core::TransportError>(Availability { supported, enabled })
        })();

        availability.unwrap_or_else(|e| {
            warn!(error = %e, "Availability check failed");
            Availability::default()
        })
    }

    /// Check availability and, if the hardware is off, open the platform
    /// settings so the user can switch it on
    pub fn ensure_enabled(&mut self) -> Availability {
        let availability = self.check_availability();
        if availability.supported && !availability.enabled {
            info!("Near-field hardware is off, opening settings");
            if let Err(e) = self.adapter.open_settings() {
                warn!(error = %e, "Could not open near-field settings");
            }
        }
        availability
    }

    /// Read whatever the presented tag reports about itself
    ///
    /// Tries NDEF, then ISO-DEP, then any technology, and returns `None`
    /// if none could be acquired within `timeout` each.
    pub fn read_card_once(&mut self, timeout: Duration) -> Option<CardData> {
        let session = SessionNegotiator::new(&mut self.adapter)
            .with_alert_message(self.config.alert_message.clone())
            .with_timeout(timeout)
            .acquire_for_tag();

        match session {
            Ok(session) => {
                info!(kind = %session.kind(), technology = %session.technology(), "Tag read");
                Some(CardData::from_tag(session.tag(), session.kind()))
            }
            Err(e) => {
                info!(error = %e, "Card not detected");
                None
            }
        }
    }

    /// Read payment card data over EMV
    ///
    /// Returns `None` if no session could be acquired or the session broke
    /// down. A card that answered but carried no payment data yields a
    /// [`CardData`] without PAN.
    pub fn read_emv_once(&mut self) -> Option<CardData> {
        self.read_emv_detailed().map(|read| read.card)
    }

    /// Like [`read_emv_once`](Self::read_emv_once), keeping the decoded data
    pub fn read_emv_detailed(&mut self) -> Option<EmvRead> {
        match self.try_read_emv() {
            Ok(read) => Some(read),
            Err(e) => {
                info!(error = %e, "EMV read failed");
                None
            }
        }
    }

    fn try_read_emv(&mut self) -> Result<EmvRead, EmvError> {
        let mut session = SessionNegotiator::new(&mut self.adapter)
            .with_alert_message(self.config.alert_message.clone())
            .with_timeout(self.config.timeout)
            .acquire_for_emv()?;

        let outcome = EmvDiscovery::new(&self.config).run(&mut session)?;
        let tag = session.tag().clone();
        session.release();

        Ok(match outcome {
            DiscoveryOutcome::Found(found) => {
                let card = CardData::from_fields(found.fields, &tag, &found.aid);
                info!(
                    aid = %found.aid,
                    pan = card.masked_pan().as_deref().unwrap_or_default(),
                    expiry = card.expiry().as_deref().unwrap_or_default(),
                    "Card read"
                );
                EmvRead {
                    card,
                    nodes: found.nodes,
                    tag,
                }
            }
            DiscoveryOutcome::NoPaymentData { .. } => EmvRead {
                card: CardData::no_payment_data(&tag),
                nodes: Vec::new(),
                tag,
            },
        })
    }
}
