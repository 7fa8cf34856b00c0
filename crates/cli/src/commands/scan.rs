//! One-shot tag and EMV reads

use std::error::Error;
use std::time::Duration;

use colored::Colorize;
use emvtap_emv::{NfcCardService, ScanConfig};
use emvtap_nfc_pcsc::{PcscConfig, PcscNfcAdapter};
use tracing::info;

use crate::display;

/// How to present an EMV read
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EmvOutput {
    pub(crate) show_pan: bool,
    pub(crate) json: bool,
    pub(crate) dump: bool,
}

fn service(
    pcsc: PcscConfig,
    scan: ScanConfig,
) -> Result<NfcCardService<PcscNfcAdapter>, Box<dyn Error>> {
    let mut service = NfcCardService::with_config(PcscNfcAdapter::new(pcsc)?, scan);
    if !service.init() {
        return Err("PC/SC contactless reading is not available".into());
    }
    Ok(service)
}

/// Read whatever the presented tag reports about itself
pub(crate) fn read_command(
    pcsc: PcscConfig,
    scan: ScanConfig,
    timeout: Duration,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    let mut service = service(pcsc, scan)?;
    println!("{}", service.config().alert_message);

    let Some(card) = service.read_card_once(timeout) else {
        println!("{}", "Card not detected, try again".yellow());
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&card)?);
    } else {
        display::print_card(&card, false);
    }
    Ok(())
}

/// Read payment card data over EMV
pub(crate) fn emv_command(
    pcsc: PcscConfig,
    scan: ScanConfig,
    output: EmvOutput,
) -> Result<(), Box<dyn Error>> {
    let mut service = service(pcsc, scan)?;
    println!("{}", service.config().alert_message);

    let Some(read) = service.read_emv_detailed() else {
        println!("{}", "Card not detected, try again".yellow());
        return Ok(());
    };
    info!(reader = read.tag.reader.as_deref().unwrap_or_default(), "Read complete");

    if output.json {
        println!("{}", display::card_json(&read.card, output.show_pan)?);
    } else {
        if !read.card.has_pan() {
            println!("{}", "Card read but it carries no payment data".yellow());
        }
        display::print_card(&read.card, output.show_pan);
    }

    if output.dump && !read.nodes.is_empty() {
        println!();
        display::print_tree(&read.nodes);
    }
    Ok(())
}
