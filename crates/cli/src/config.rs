//! Optional configuration file, `~/.emvtap/emvtap.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use emvtap_emv::ScanConfig;
use emvtap_nfc_pcsc::PcscConfig;
use eyre::OptionExt;
use figment::{
    Figment,
    providers::{Format, Toml},
};
use serde::{Deserialize, Serialize};

/// Settings read from the configuration file
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct Config {
    /// Reader to watch for cards
    pub(crate) reader: Option<String>,
    /// AIDs to try when the card lists none, as hex
    pub(crate) fallback_aids: Option<Vec<String>>,
    /// How long to wait for a card
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) skip_failed_records: Option<bool>,
}

impl Config {
    /// PC/SC settings, with `reader` taking precedence over the file
    pub(crate) fn pcsc(&self, reader: Option<&str>) -> PcscConfig {
        match reader.or(self.reader.as_deref()) {
            Some(name) => PcscConfig::default().with_reader(name),
            None => PcscConfig::default(),
        }
    }

    /// Scan settings from the file, before command-line overrides
    pub(crate) fn scan(&self) -> ScanConfig {
        let mut config = ScanConfig::default();
        if let Some(aids) = &self.fallback_aids {
            config = config.with_fallback_aids(aids);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        if let Some(skip) = self.skip_failed_records {
            config = config.with_skip_failed_records(skip);
        }
        config
    }
}

/// Returns the base config directory for emvtap
pub(crate) fn config_dir() -> eyre::Result<PathBuf> {
    Ok(std::env::home_dir()
        .ok_or_eyre("home directory not found")?
        .join(".emvtap"))
}

/// Load the configuration, from `path` if given
///
/// A missing file yields the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> eyre::Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_dir()?.join("emvtap.toml"),
    };

    Ok(Figment::new()
        .merge(Toml::file(path))
        .extract()?)
}
