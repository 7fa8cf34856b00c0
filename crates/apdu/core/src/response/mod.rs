//! APDU response helpers
//!
//! Responses are handed around as raw bytes, trailing status word included.
//! These helpers split off and interpret the status word where a caller
//! wants it.

pub mod status;

use tracing::trace;

use status::StatusWord;

/// Split a raw response into its trailing status word and the payload
///
/// Returns `None` if the response is too short to carry a status word.
pub fn split_status(data: &[u8]) -> Option<(StatusWord, &[u8])> {
    if data.len() < 2 {
        trace!(len = data.len(), "Response too short for a status word");
        return None;
    }

    let (payload, sw) = data.split_at(data.len() - 2);
    Some((StatusWord::new(sw[0], sw[1]), payload))
}

/// Status word of a raw response, if it carries one
pub fn status_of(data: &[u8]) -> Option<StatusWord> {
    split_status(data).map(|(status, _)| status)
}
