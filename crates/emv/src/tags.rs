//! EMV tag numbers, folded big-endian as the TLV decoder reports them

/// Application Identifier (AID), card
pub const APPLICATION_IDENTIFIER: u32 = 0x4F;
/// Application Label
pub const APPLICATION_LABEL: u32 = 0x50;
/// Track 1 Discretionary Data
pub const TRACK1_DATA: u32 = 0x56;
/// Track 2 Equivalent Data
pub const TRACK2_EQUIVALENT_DATA: u32 = 0x57;
/// Application Primary Account Number
pub const PAN: u32 = 0x5A;
/// Cardholder Name
pub const CARDHOLDER_NAME: u32 = 0x5F20;
/// Application Expiration Date (YYMMDD)
pub const EXPIRATION_DATE: u32 = 0x5F24;
/// Application Effective Date (YYMMDD)
pub const EFFECTIVE_DATE: u32 = 0x5F25;
/// Issuer Country Code
pub const ISSUER_COUNTRY_CODE: u32 = 0x5F28;
/// Language Preference
pub const LANGUAGE_PREFERENCE: u32 = 0x5F2D;
/// Application PAN Sequence Number
pub const PAN_SEQUENCE_NUMBER: u32 = 0x5F34;
/// Application Template
pub const APPLICATION_TEMPLATE: u32 = 0x61;
/// File Control Information Template
pub const FCI_TEMPLATE: u32 = 0x6F;
/// READ RECORD Response Message Template
pub const RECORD_TEMPLATE: u32 = 0x70;
/// Response Message Template Format 2
pub const RESPONSE_TEMPLATE_FORMAT_2: u32 = 0x77;
/// Response Message Template Format 1
pub const RESPONSE_TEMPLATE_FORMAT_1: u32 = 0x80;
/// Application Interchange Profile
pub const AIP: u32 = 0x82;
/// Command Template
pub const COMMAND_TEMPLATE: u32 = 0x83;
/// Dedicated File (DF) Name
pub const DF_NAME: u32 = 0x84;
/// Application Priority Indicator
pub const APPLICATION_PRIORITY: u32 = 0x87;
/// Application File Locator
pub const AFL: u32 = 0x94;
/// File Control Information Proprietary Template
pub const FCI_PROPRIETARY_TEMPLATE: u32 = 0xA5;
/// File Control Information Issuer Discretionary Data
pub const FCI_ISSUER_DISCRETIONARY_DATA: u32 = 0xBF0C;
/// Application Preferred Name
pub const APPLICATION_PREFERRED_NAME: u32 = 0x9F12;
/// Processing Options Data Object List
pub const PDOL: u32 = 0x9F38;
/// Application Transaction Counter
pub const ATC: u32 = 0x9F36;
/// Track 2 Data (magnetic stripe mode)
pub const TRACK2_DATA: u32 = 0x9F6B;

/// Human-readable name of a tag
pub const fn tag_name(tag: u32) -> &'static str {
    match tag {
        0x4F => "Application Identifier (AID)",
        0x50 => "Application Label",
        0x56 => "Track 1 Data",
        0x57 => "Track 2 Equivalent Data",
        0x5A => "Application PAN",
        0x5F20 => "Cardholder Name",
        0x5F24 => "Application Expiration Date",
        0x5F25 => "Application Effective Date",
        0x5F28 => "Issuer Country Code",
        0x5F2A => "Transaction Currency Code",
        0x5F2D => "Language Preference",
        0x5F34 => "Application PAN Sequence Number",
        0x61 => "Application Template",
        0x6F => "FCI Template",
        0x70 => "Record Template",
        0x77 => "Response Message Template Format 2",
        0x80 => "Response Message Template Format 1",
        0x82 => "Application Interchange Profile",
        0x83 => "Command Template",
        0x84 => "DF Name",
        0x87 => "Application Priority Indicator",
        0x8C => "CDOL1",
        0x8D => "CDOL2",
        0x8E => "CVM List",
        0x8F => "CA Public Key Index",
        0x90 => "Issuer Public Key Certificate",
        0x92 => "Issuer Public Key Remainder",
        0x94 => "Application File Locator",
        0xA5 => "FCI Proprietary Template",
        0xBF0C => "FCI Issuer Discretionary Data",
        0x9F07 => "Application Usage Control",
        0x9F08 => "Application Version Number (Card)",
        0x9F0D => "Issuer Action Code - Default",
        0x9F0E => "Issuer Action Code - Denial",
        0x9F0F => "Issuer Action Code - Online",
        0x9F10 => "Issuer Application Data",
        0x9F11 => "Issuer Code Table Index",
        0x9F12 => "Application Preferred Name",
        0x9F1F => "Track 1 Discretionary Data",
        0x9F26 => "Application Cryptogram",
        0x9F27 => "Cryptogram Information Data",
        0x9F32 => "Issuer Public Key Exponent",
        0x9F36 => "Application Transaction Counter",
        0x9F38 => "PDOL",
        0x9F42 => "Application Currency Code",
        0x9F44 => "Application Currency Exponent",
        0x9F46 => "ICC Public Key Certificate",
        0x9F47 => "ICC Public Key Exponent",
        0x9F48 => "ICC Public Key Remainder",
        0x9F4A => "Static Data Authentication Tag List",
        0x9F4D => "Log Entry",
        0x9F6B => "Track 2 Data",
        0x9F6C => "Card Transaction Qualifiers",
        _ => "Unknown Tag",
    }
}
