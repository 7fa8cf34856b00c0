//! Configuration options for a scan attempt

use std::ops::RangeInclusive;
use std::time::Duration;

use emvtap_apdu_core::nfc::{DEFAULT_ALERT_MESSAGE, DEFAULT_TIMEOUT};

use crate::aid::DEFAULT_FALLBACK_AIDS;
use crate::commands::MAX_SFI;
use crate::tlv::DEFAULT_MAX_DEPTH;

/// Configuration options for a scan attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    /// AIDs tried when the card lists no applications, as hex
    pub fallback_aids: Vec<String>,

    /// Short file identifiers to read records from
    pub sfi_range: RangeInclusive<u8>,

    /// Record numbers read within each file
    pub record_range: RangeInclusive<u8>,

    /// Deepest TLV nesting level decoded
    pub max_depth: usize,

    /// Prompt shown while waiting for a card
    pub alert_message: String,

    /// How long to wait for a card
    pub timeout: Duration,

    /// Leave record responses without a `90 00` status out of the decoded data
    pub skip_failed_records: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fallback_aids: DEFAULT_FALLBACK_AIDS.iter().map(|aid| aid.to_string()).collect(),
            sfi_range: 1..=MAX_SFI,
            record_range: 1..=10,
            max_depth: DEFAULT_MAX_DEPTH,
            alert_message: DEFAULT_ALERT_MESSAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
            skip_failed_records: false,
        }
    }
}

impl ScanConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the fallback AIDs
    ///
    /// Entries are normalized to uppercase hex without whitespace.
    pub fn with_fallback_aids<I, S>(mut self, aids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fallback_aids = aids
            .into_iter()
            .map(|aid| {
                aid.as_ref()
                    .chars()
                    .filter(|c| !c.is_whitespace())
                    .collect::<String>()
                    .to_ascii_uppercase()
            })
            .filter(|aid| !aid.is_empty())
            .collect();
        self
    }

    /// Set the short file identifiers to read, clamped to 1..=31
    pub fn with_sfi_range(mut self, range: RangeInclusive<u8>) -> Self {
        self.sfi_range = (*range.start()).max(1)..=(*range.end()).min(MAX_SFI);
        self
    }

    /// Set the record numbers to read, clamped to start at 1
    pub fn with_record_range(mut self, range: RangeInclusive<u8>) -> Self {
        self.record_range = (*range.start()).max(1)..=*range.end();
        self
    }

    /// Set the TLV depth cap
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the user-facing prompt
    pub fn with_alert_message(mut self, message: impl Into<String>) -> Self {
        self.alert_message = message.into();
        self
    }

    /// Set how long to wait for a card
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Leave failed record reads out of the decoded data
    pub const fn with_skip_failed_records(mut self, skip: bool) -> Self {
        self.skip_failed_records = skip;
        self
    }

    /// Number of READ RECORD commands issued per application
    pub fn records_per_application(&self) -> usize {
        self.sfi_range.clone().count() * self.record_range.clone().count()
    }
}
