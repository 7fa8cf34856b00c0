//! Command handlers

mod apdu;
mod readers;
mod scan;

pub(crate) use apdu::apdu_command;
pub(crate) use readers::{list_command, status_command};
pub(crate) use scan::{EmvOutput, emv_command, read_command};
