//! Reader listing and availability

use std::error::Error;

use colored::Colorize;
use emvtap_emv::NfcCardService;
use emvtap_nfc_pcsc::{PcscConfig, PcscDeviceManager, PcscError, PcscNfcAdapter};
use tracing::debug;

/// List the PC/SC readers and whether a card is present
pub(crate) fn list_command() -> Result<(), Box<dyn Error>> {
    let manager = PcscDeviceManager::new()?;
    let readers = match manager.list_readers() {
        Ok(readers) => readers,
        Err(PcscError::NoReadersAvailable) => Vec::new(),
        Err(e) => return Err(e.into()),
    };

    if readers.is_empty() {
        println!("No readers found!");
        return Ok(());
    }

    println!("Available readers:");
    for (i, reader) in readers.iter().enumerate() {
        let status = match reader.technology().filter(|_| reader.has_card()) {
            Some(technology) => format!("card present, {technology}").as_str().green(),
            None if reader.has_card() => "card present".green(),
            None => "no card".normal(),
        };
        println!("{}. {} ({})", i + 1, reader.name(), status);
    }

    Ok(())
}

/// Report whether contactless reading is possible right now
pub(crate) fn status_command(config: PcscConfig) -> Result<(), Box<dyn Error>> {
    let adapter = match PcscNfcAdapter::new(config) {
        Ok(adapter) => adapter,
        Err(e) => {
            debug!(error = %e, "PC/SC unavailable");
            println!("{}: {}", "Supported".bold(), "no".red());
            return Ok(());
        }
    };

    let mut service = NfcCardService::new(adapter);
    service.init();
    let availability = service.check_availability();

    let yes_no = |value: bool| if value { "yes".green() } else { "no".red() };
    println!("{}: {}", "Supported".bold(), yes_no(availability.supported));
    println!("{}: {}", "Enabled".bold(), yes_no(availability.enabled));
    if availability.supported && !availability.enabled {
        println!("{}", "Connect a contactless reader to scan cards".yellow());
    }

    Ok(())
}
