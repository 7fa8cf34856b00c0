//! Raw command exchange over an ISO-DEP session

use std::error::Error;

use colored::Colorize;
use emvtap_apdu_core::{CardTransport, Command, codec};
use emvtap_emv::{ScanConfig, SessionNegotiator};
use emvtap_nfc_pcsc::{PcscConfig, PcscNfcAdapter};

use crate::display;

/// Send each hex command to the presented card and print the responses
pub(crate) fn apdu_command(
    pcsc: PcscConfig,
    scan: &ScanConfig,
    commands: &[String],
) -> Result<(), Box<dyn Error>> {
    // Reject bad literals before waiting for a card
    let commands = commands
        .iter()
        .map(|command| codec::hex_to_bytes(command))
        .collect::<Result<Vec<_>, _>>()?;

    let mut adapter = PcscNfcAdapter::new(pcsc)?;
    println!("{}", scan.alert_message);
    let mut session = SessionNegotiator::new(&mut adapter)
        .with_alert_message(scan.alert_message.clone())
        .with_timeout(scan.timeout)
        .acquire_for_emv()?;

    for command in &commands {
        println!("{}: {}", "Command".bold(), hex::encode_upper(command));
        println!("{}", display::describe_command(&Command::from_bytes(command)).as_str().dimmed());
        let response = session.transmit_raw(command)?;
        display::print_response(&response);
        println!();
    }

    session.release();
    Ok(())
}
