//! Terminal output for cards, readers and decoded TLV data

use colored::Colorize;
use emvtap_apdu_core::Command;
use emvtap_apdu_core::response::split_status;
use emvtap_emv::{CardData, TlvNode, aid::scheme_name};

/// Print the card data, masking the PAN unless `show_pan` is set
pub(crate) fn print_card(card: &CardData, show_pan: bool) {
    match card.pan.as_deref() {
        Some(pan) if show_pan => println!("{:>12}: {}", "PAN".bold(), pan.green()),
        Some(_) => println!(
            "{:>12}: {}",
            "PAN".bold(),
            card.masked_pan().unwrap_or_default().as_str().green()
        ),
        None => println!("{:>12}: {}", "PAN".bold(), "not found".yellow()),
    }

    if let Some(expiry) = card.expiry() {
        println!("{:>12}: {}", "Expiry".bold(), expiry);
    }
    if let Some(name) = &card.cardholder_name {
        println!("{:>12}: {}", "Cardholder".bold(), name);
    }
    if let Some(aid) = card.aid() {
        match scheme_name(aid) {
            Some(scheme) => println!("{:>12}: {} ({})", "AID".bold(), aid, scheme),
            None => println!("{:>12}: {}", "AID".bold(), aid),
        }
    }
    if let Some(technology) = card.raw["tag"]["technology"].as_str() {
        println!("{:>12}: {}", "Technology".bold(), technology);
    }
    if let Some(id) = card.raw["tag"]["id"].as_str().filter(|id| !id.is_empty()) {
        println!("{:>12}: {}", "UID".bold(), id);
    }
}

/// The card as JSON, with the PAN masked unless `show_pan` is set
pub(crate) fn card_json(card: &CardData, show_pan: bool) -> serde_json::Result<String> {
    if show_pan {
        return serde_json::to_string_pretty(card);
    }

    let mut masked = card.clone();
    masked.pan = card.masked_pan();
    serde_json::to_string_pretty(&masked)
}

/// Print a decoded TLV tree, one node per line
pub(crate) fn print_tree(nodes: &[TlvNode]) {
    print_level(nodes, 0);
}

fn print_level(nodes: &[TlvNode], indent: usize) {
    for node in nodes {
        let pad = "  ".repeat(indent);
        let tag = format!("{:X}", node.tag);
        match &node.children {
            Some(children) => {
                println!("{pad}{} {} ({} bytes)", tag.as_str().cyan(), node.name().bold(), node.length);
                print_level(children, indent + 1);
            }
            None => println!(
                "{pad}{} {}: {}",
                tag.as_str().cyan(),
                node.name(),
                hex::encode_upper(&node.value)
            ),
        }
    }
}

/// Header fields of a command, e.g. `CLA 00 INS B2 P1 01 P2 0C Le 00`
pub(crate) fn describe_command(command: &Command) -> String {
    let mut fields = format!(
        "CLA {:02X} INS {:02X} P1 {:02X} P2 {:02X}",
        command.cla, command.ins, command.p1, command.p2
    );
    if let Some(data) = &command.data {
        fields.push_str(&format!(" Data {}", hex::encode_upper(data)));
    }
    if let Some(le) = command.le {
        fields.push_str(&format!(" Le {le:02X}"));
    }
    fields
}

/// Print a raw response, its status word, and the decoded payload
pub(crate) fn print_response(response: &[u8]) {
    println!("{}: {}", "Response".bold(), hex::encode_upper(response));

    let Some((status, payload)) = split_status(response) else {
        println!("{}", "Response carries no status word".yellow());
        return;
    };

    let status_line = format!("{} ({})", status, status.description());
    if status.is_success() {
        println!("{}: {}", "Status".bold(), status_line.as_str().green());
    } else {
        println!("{}: {}", "Status".bold(), status_line.as_str().red());
    }

    let nodes = emvtap_emv::parse_tlv(payload);
    if !nodes.is_empty() {
        print_tree(&nodes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_command() {
        let read_record = Command::from_bytes(&[0x00, 0xB2, 0x01, 0x0C, 0x00]);
        assert_eq!(describe_command(&read_record), "CLA 00 INS B2 P1 01 P2 0C Le 00");

        let gpo = Command::from_bytes(&[0x80, 0xA8, 0x00, 0x00, 0x02, 0x83, 0x00, 0x00]);
        assert_eq!(
            describe_command(&gpo),
            "CLA 80 INS A8 P1 00 P2 00 Data 8300 Le 00"
        );
    }
}
