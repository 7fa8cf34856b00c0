//! Scripted near-field adapter emulating a contactless payment card

#![allow(dead_code, unreachable_pub)]

use std::collections::HashMap;

use emvtap_apdu_core::{Bytes, NfcAdapter, TagInfo, Technology, TechnologyRequest, TransportError};

pub const SELECT_PPSE: &str = "00A404000E325041592E5359532E4444463031";
pub const GPO: &str = "80A8000002830000";

pub const VISA: &str = "A0000000031010";
pub const MASTERCARD: &str = "A0000000041010";

/// Track 2 for PAN 4761739900001111, expiry 2028/01
pub const TRACK2_RECORD: &str = "7010570E4761739900001111D2801101123F9000";

/// Discrete PAN 5413330089600010, expiry 2025/12
pub const DISCRETE_RECORD: &str = "70105A0854133300896000105F24032512319000";

pub const GPO_RESPONSE: &str = "770A820220009404080101009000";

/// PPSE response listing the given AIDs
pub fn ppse_response(aids: &[&str]) -> String {
    let entries: String = aids
        .iter()
        .map(|aid| {
            let aid_len = aid.len() / 2;
            format!("61{:02X}4F{:02X}{aid}", aid_len + 2, aid_len)
        })
        .collect();
    let directory = format!("BF0C{:02X}{entries}", entries.len() / 2);
    let proprietary = format!("A5{:02X}{directory}", directory.len() / 2);
    let body = format!("840E325041592E5359532E4444463031{proprietary}");
    format!("6F{:02X}{body}9000", body.len() / 2)
}

/// A payment application on the emulated card
#[derive(Debug, Clone, Default)]
pub struct Application {
    pub gpo: Vec<u8>,
    /// Records keyed by (SFI, record number)
    pub records: HashMap<(u8, u8), Vec<u8>>,
}

impl Application {
    pub fn new() -> Self {
        Self {
            gpo: hex(GPO_RESPONSE),
            records: HashMap::new(),
        }
    }

    pub fn record(mut self, sfi: u8, record: u8, response: &str) -> Self {
        self.records.insert((sfi, record), hex(response));
        self
    }
}

/// Adapter emulating one card in the field
#[derive(Debug)]
pub struct ScriptedAdapter {
    pub supported: bool,
    pub enabled: bool,
    /// Technologies the card can be activated through
    pub offered: Vec<Technology>,
    pub ppse: Vec<u8>,
    pub applications: HashMap<String, Application>,
    /// Response to READ RECORD for a record the application lacks
    pub missing_record: Vec<u8>,
    /// Commands starting with this hex prefix raise the error
    pub failure: Option<(String, TransportError)>,

    pub selected: Option<String>,
    pub held: Option<Technology>,
    pub requests: Vec<TechnologyRequest>,
    pub commands: Vec<String>,
    pub releases: usize,
    pub settings_opened: usize,
}

impl Default for ScriptedAdapter {
    fn default() -> Self {
        Self {
            supported: true,
            enabled: true,
            offered: vec![Technology::IsoDep, Technology::NfcA],
            ppse: hex("6A82"),
            applications: HashMap::new(),
            missing_record: Vec::new(),
            failure: None,
            selected: None,
            held: None,
            requests: Vec::new(),
            commands: Vec::new(),
            releases: 0,
            settings_opened: 0,
        }
    }
}

impl ScriptedAdapter {
    /// A card listing `aids` in its directory
    pub fn with_directory(aids: &[&str]) -> Self {
        Self {
            ppse: hex(&ppse_response(aids)),
            ..Default::default()
        }
    }

    pub fn application(mut self, aid: &str, application: Application) -> Self {
        self.applications.insert(aid.to_string(), application);
        self
    }

    pub fn offering(mut self, technologies: &[Technology]) -> Self {
        self.offered = technologies.to_vec();
        self
    }

    pub fn failing_on(mut self, prefix: &str, error: TransportError) -> Self {
        self.failure = Some((prefix.to_string(), error));
        self
    }

    /// Commands starting with the given hex prefix
    pub fn sent(&self, prefix: &str) -> usize {
        self.commands.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn respond(&mut self, command: &[u8]) -> Vec<u8> {
        match command {
            [0x00, 0xA4, 0x04, 0x00, _, name @ ..] if name == b"2PAY.SYS.DDF01" => self.ppse.clone(),
            [0x00, 0xA4, 0x04, 0x00, _, aid @ ..] => {
                let aid = hex::encode_upper(aid);
                if self.applications.contains_key(&aid) {
                    self.selected = Some(aid);
                    hex("9000")
                } else {
                    self.selected = None;
                    hex("6A82")
                }
            }
            [0x80, 0xA8, ..] => self
                .selected_application()
                .map(|app| app.gpo.clone())
                .unwrap_or_else(|| hex("6985")),
            [0x00, 0xB2, record, p2, ..] => {
                let key = (p2 >> 3, *record);
                self.selected_application()
                    .and_then(|app| app.records.get(&key).cloned())
                    .unwrap_or_else(|| self.missing_record.clone())
            }
            _ => hex("6D00"),
        }
    }

    fn selected_application(&self) -> Option<&Application> {
        self.selected.as_ref().and_then(|aid| self.applications.get(aid))
    }
}

impl NfcAdapter for ScriptedAdapter {
    fn is_supported(&self) -> Result<bool, TransportError> {
        Ok(self.supported)
    }

    fn is_enabled(&self) -> Result<bool, TransportError> {
        Ok(self.enabled)
    }

    fn open_settings(&mut self) -> Result<(), TransportError> {
        self.settings_opened += 1;
        Ok(())
    }

    fn request_technology(&mut self, request: &TechnologyRequest) -> Result<TagInfo, TransportError> {
        self.requests.push(request.clone());
        let technology = request
            .technologies
            .iter()
            .copied()
            .find(|t| self.offered.contains(t))
            .ok_or(TransportError::Timeout)?;

        self.held = Some(technology);
        Ok(TagInfo {
            technology,
            id: vec![0x04, 0x5C, 0x2A, 0x91],
            atr: Vec::new(),
            reader: None,
        })
    }

    fn transceive(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        if self.held.is_none() {
            return Err(TransportError::NotConnected);
        }

        let command_hex = hex::encode_upper(command);
        self.commands.push(command_hex.clone());

        if let Some((prefix, error)) = &self.failure {
            if command_hex.starts_with(prefix.as_str()) {
                return Err(error.clone());
            }
        }

        Ok(self.respond(command).into())
    }

    fn cancel_technology_request(&mut self) -> Result<(), TransportError> {
        self.releases += 1;
        self.held = None;
        Ok(())
    }
}

pub fn hex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}
