//! Session release and failure containment

mod common;

use std::time::Duration;

use common::*;
use emvtap_apdu_core::{Availability, Technology, TransportError};
use emvtap_emv::{NfcCardService, ScanConfig};

fn card() -> ScriptedAdapter {
    ScriptedAdapter::with_directory(&[VISA, MASTERCARD])
        .application(VISA, Application::new().record(1, 1, TRACK2_RECORD))
        .application(MASTERCARD, Application::new().record(1, 1, DISCRETE_RECORD))
}

fn small_scan() -> ScanConfig {
    ScanConfig::default().with_sfi_range(1..=2).with_record_range(1..=2)
}

#[test]
fn test_release_on_failure_at_each_step() {
    let select_visa = format!("00A4040007{VISA}");
    let cases: [(&str, TransportError); 6] = [
        (SELECT_PPSE, TransportError::Transmission),
        (select_visa.as_str(), TransportError::Transmission),
        (GPO, TransportError::Timeout),
        ("00B2010C00", TransportError::Transmission),
        ("00B2", TransportError::Connection),
        ("00B2021400", TransportError::NotConnected),
    ];

    for (prefix, error) in cases {
        let adapter = card().failing_on(prefix, error.clone());
        let mut service = NfcCardService::with_config(adapter, small_scan());
        let _ = service.read_emv_once();
        assert_eq!(service.adapter().releases, 1, "failure on {prefix} ({error})");
    }
}

#[test]
fn test_per_candidate_failures_are_contained() {
    // Visa cannot be selected, Mastercard still reads
    let select_visa = format!("00A4040007{VISA}");
    let adapter = card().failing_on(&select_visa, TransportError::Transmission);
    let mut service = NfcCardService::with_config(adapter, small_scan());

    let read = service.read_emv_once().unwrap();
    assert_eq!(read.aid(), Some(MASTERCARD));
    assert_eq!(read.pan.as_deref(), Some("5413330089600010"));

    // GPO fails for every application
    let adapter = card().failing_on(GPO, TransportError::Timeout);
    let mut service = NfcCardService::with_config(adapter, small_scan());
    let read = service.read_emv_once().unwrap();
    assert!(!read.has_pan());
    assert_eq!(service.adapter().sent("00B2"), 0);

    // Every record read fails
    let adapter = card().failing_on("00B2", TransportError::Transmission);
    let mut service = NfcCardService::with_config(adapter, small_scan());
    let read = service.read_emv_once().unwrap();
    assert!(!read.has_pan());
    assert_eq!(service.adapter().sent("00B2"), 2 * 4);
}

#[test]
fn test_lost_session_aborts_read() {
    let adapter = card().failing_on("00B2020C00", TransportError::NotConnected);
    let mut service = NfcCardService::with_config(adapter, small_scan());

    assert!(service.read_emv_once().is_none());

    let adapter = service.adapter();
    // No further record or application after the session was lost
    assert_eq!(adapter.commands.last().map(String::as_str), Some("00B2020C00"));
    assert_eq!(adapter.sent(&format!("00A4040007{MASTERCARD}")), 0);
    assert_eq!(adapter.releases, 1);
}

#[test]
fn test_release_when_no_card() {
    let adapter = card().offering(&[]);
    let mut service = NfcCardService::new(adapter);

    assert!(service.read_emv_once().is_none());
    assert_eq!(service.adapter().releases, 1);
    assert!(service.adapter().commands.is_empty());

    assert!(service.read_card_once(Duration::from_millis(100)).is_none());
    assert_eq!(service.adapter().releases, 2);
}

#[test]
fn test_each_attempt_is_fresh() {
    let mut service = NfcCardService::with_config(card(), small_scan());

    let first = service.read_emv_once().unwrap();
    let second = service.read_emv_once().unwrap();
    assert_eq!(first, second);
    assert_eq!(service.adapter().releases, 2);
    assert_eq!(service.adapter().sent(SELECT_PPSE), 2);
}

#[test]
fn test_read_card_technology_order() {
    let mut service = NfcCardService::new(card().offering(&[Technology::Ndef, Technology::IsoDep]));
    let tag = service.read_card_once(Duration::from_secs(1)).unwrap();
    assert_eq!(tag.raw["technology"], "Ndef");
    assert!(tag.pan.is_none());
    assert_eq!(service.adapter().requests.len(), 1);

    let mut service = NfcCardService::new(card().offering(&[Technology::IsoDep]));
    let tag = service.read_card_once(Duration::from_secs(1)).unwrap();
    assert_eq!(tag.raw["technology"], "IsoDep");
    assert_eq!(tag.raw["tag"]["id"], "045C2A91");
    assert_eq!(service.adapter().requests.len(), 2);
    assert_eq!(service.adapter().requests[1].timeout, Duration::from_secs(1));

    let mut service = NfcCardService::new(card().offering(&[Technology::NfcA]));
    let tag = service.read_card_once(Duration::from_secs(1)).unwrap();
    assert_eq!(tag.raw["technology"], "Generic");
    assert_eq!(tag.raw["tag"]["technology"], "NfcA");
    assert_eq!(service.adapter().requests.len(), 3);
    assert_eq!(service.adapter().releases, 1);
    // A tag read exchanges no APDUs
    assert!(service.adapter().commands.is_empty());
}

#[test]
fn test_availability() {
    let mut service = NfcCardService::new(card());
    assert!(service.init());
    assert!(service.is_supported());
    assert_eq!(
        service.check_availability(),
        Availability {
            supported: true,
            enabled: true
        }
    );

    let mut off = card();
    off.enabled = false;
    let mut service = NfcCardService::new(off);
    assert!(service.init());
    assert!(!service.is_supported());
    let availability = service.ensure_enabled();
    assert!(availability.supported && !availability.enabled);
    assert_eq!(service.adapter().settings_opened, 1);

    let mut absent = card();
    absent.supported = false;
    absent.enabled = true;
    let mut service = NfcCardService::new(absent);
    assert!(!service.init());
    assert_eq!(service.check_availability(), Availability::default());
    service.ensure_enabled();
    assert_eq!(service.adapter().settings_opened, 0);
}
