//! Payment application discovery
//!
//! Selects the payment directory, then walks the candidate applications in
//! order. For each one it selects the application, gets processing options
//! with an empty PDOL and reads every record in the configured SFI and
//! record ranges without consulting the AFL. The GPO response and all
//! record responses are decoded together and searched for payment fields;
//! the first application that yields a PAN ends the walk.

use bytes::BytesMut;
use emvtap_apdu_core::response::status_of;
use emvtap_apdu_core::{CardTransport, TransportError};
use tracing::{debug, info, trace};

use crate::aid::candidate_aids;
use crate::commands::{get_processing_options, read_record, select_aid_hex, select_ppse};
use crate::config::ScanConfig;
use crate::error::EmvError;
use crate::extract::{PaymentFields, extract_payment_fields};
use crate::tlv::{TlvNode, parse_tlv_with_depth};

/// Application that yielded a PAN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationMatch {
    /// AID of the application, uppercase hex
    pub aid: String,
    /// Extracted payment fields
    pub fields: PaymentFields,
    /// Decoded GPO and record data the fields were taken from
    pub nodes: Vec<TlvNode>,
}

/// What a completed discovery found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// An application yielded a PAN
    Found(ApplicationMatch),
    /// Every candidate was tried without finding a PAN
    NoPaymentData {
        /// The candidates tried, in order
        candidates: Vec<String>,
    },
}

/// Drives the EMV command script over a transport
#[derive(Debug, Clone, Copy)]
pub struct EmvDiscovery<'c> {
    config: &'c ScanConfig,
}

impl<'c> EmvDiscovery<'c> {
    /// Create a discovery run with the given configuration
    pub const fn new(config: &'c ScanConfig) -> Self {
        Self { config }
    }

    /// Run discovery over the given transport
    ///
    /// Failures of a single application or record are skipped. Only a failed
    /// directory selection or a transport error that leaves the session
    /// unusable ends the run early.
    pub fn run<T>(&self, transport: &mut T) -> Result<DiscoveryOutcome, EmvError>
    where
        T: CardTransport + ?Sized,
    {
        let ppse = transport
            .transmit_command(&select_ppse())
            .map_err(EmvError::Directory)?;

        let candidates = candidate_aids(&ppse, &self.config.fallback_aids, self.config.max_depth);
        debug!(?candidates, "Candidate applications");

        for aid in &candidates {
            match self.try_application(transport, aid) {
                Ok(Some(found)) => {
                    info!(aid = %found.aid, "Payment data found");
                    return Ok(DiscoveryOutcome::Found(found));
                }
                Ok(None) => debug!(%aid, "No payment data in application"),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => debug!(%aid, error = %e, "Application skipped"),
            }
        }

        info!(tried = candidates.len(), "No payment data on card");
        Ok(DiscoveryOutcome::NoPaymentData { candidates })
    }

    /// Select one application and read its data
    fn try_application<T>(
        &self,
        transport: &mut T,
        aid: &str,
    ) -> Result<Option<ApplicationMatch>, TransportError>
    where
        T: CardTransport + ?Sized,
    {
        let select = select_aid_hex(aid)?;
        let response = transport.transmit_command(&select)?;
        trace!(%aid, status = ?status_of(&response), "Application selected");

        let gpo = transport.transmit_command(&get_processing_options())?;

        let mut combined = BytesMut::from(gpo.as_ref());
        for sfi in self.config.sfi_range.clone() {
            for record in self.config.record_range.clone() {
                match transport.transmit_command(&read_record(record, sfi)) {
                    Ok(response) => {
                        let failed = self.config.skip_failed_records
                            && !status_of(&response).is_some_and(|sw| sw.is_success());
                        if failed {
                            trace!(sfi, record, "Record left out");
                        } else {
                            combined.extend_from_slice(&response);
                        }
                    }
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => trace!(sfi, record, error = %e, "Record read failed"),
                }
            }
        }

        let nodes = parse_tlv_with_depth(&combined, self.config.max_depth);
        let fields = extract_payment_fields(&nodes);

        Ok(fields.has_pan().then(|| ApplicationMatch {
            aid: aid.to_string(),
            fields,
            nodes,
        }))
    }
}
