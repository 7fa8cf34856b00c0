//! Device manager for PC/SC operations

use std::time::{Duration, Instant};

use pcsc::{Card, Context, Protocols, ReaderState, Scope, State};
use tracing::{debug, trace};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::reader::PcscReader;

/// Manager for PC/SC device operations
#[allow(missing_debug_implementations)]
pub struct PcscDeviceManager {
    /// PC/SC context
    context: Context,
}

impl PcscDeviceManager {
    /// Create a new PC/SC device manager
    pub fn new() -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// Whether the PC/SC service still answers
    pub fn is_valid(&self) -> bool {
        self.context.is_valid().is_ok()
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let readers = match self.context.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => return Err(PcscError::NoReadersAvailable),
            Err(e) => return Err(e.into()),
        };
        if readers.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        let mut reader_states: Vec<ReaderState> = readers
            .into_iter()
            .map(|name| ReaderState::new(name, State::UNAWARE))
            .collect();

        // Zero timeout: only fetch the current state
        match self
            .context
            .get_status_change(Duration::ZERO, &mut reader_states)
        {
            Ok(()) => Ok(reader_states
                .iter()
                .map(PcscReader::from_reader_state)
                .collect()),
            Err(e) => {
                debug!(error = ?e, "Could not read reader states, assuming no cards");
                Ok(reader_states
                    .iter()
                    .map(|rs| PcscReader::new(rs.name().to_string_lossy().into_owned(), false, None))
                    .collect())
            }
        }
    }

    /// Block until a card is present on a watched reader
    ///
    /// Watches the reader named in `config`, or every reader when none is
    /// named, and returns the first one that reports a card.
    pub fn wait_for_card(
        &self,
        config: &PcscConfig,
        timeout: Duration,
    ) -> Result<PcscReader, PcscError> {
        let deadline = Instant::now() + timeout;
        let watched = |reader: &PcscReader| {
            config
                .reader
                .as_deref()
                .is_none_or(|name| reader.name() == name)
        };

        loop {
            let readers = self.list_readers()?;
            if let Some(name) = config.reader.as_deref()
                && !readers.iter().any(|r| r.name() == name)
            {
                return Err(PcscError::ReaderNotFound(name.to_string()));
            }

            if let Some(reader) = readers.into_iter().find(|r| watched(r) && r.has_card()) {
                debug!(reader = reader.name(), "Card present");
                return Ok(reader);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(PcscError::Timeout);
            }

            // Sleep on reader state changes rather than spinning
            let mut reader_states: Vec<ReaderState> = self
                .context
                .list_readers_owned()?
                .into_iter()
                .map(|name| ReaderState::new(name, State::UNAWARE))
                .collect();
            self.context
                .get_status_change(Duration::ZERO, &mut reader_states)?;
            for rs in &mut reader_states {
                rs.sync_current_state();
            }

            trace!(?remaining, "Waiting for card");
            match self
                .context
                .get_status_change(remaining.min(config.poll_interval), &mut reader_states)
            {
                Ok(()) | Err(pcsc::Error::Timeout) => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Connect to the card in the named reader
    pub fn connect(
        &self,
        reader_name: &str,
        config: &PcscConfig,
        protocols: Protocols,
    ) -> Result<Card, PcscError> {
        let reader_cstr = std::ffi::CString::new(reader_name)
            .map_err(|_| PcscError::ReaderNotFound(reader_name.to_string()))?;

        match self
            .context
            .connect(&reader_cstr, config.share_mode.into(), protocols)
        {
            Ok(card) => Ok(card),
            Err(pcsc::Error::NoSmartcard) => Err(PcscError::NoCard(reader_name.to_string())),
            Err(pcsc::Error::UnknownReader) => {
                Err(PcscError::ReaderNotFound(reader_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
