//! Text fallbacks for bytes that are not protocol frames.

use crate::error::DecodeError;

/// Strict UTF-8 decode; the caller picks the fallback.
pub fn decode_utf8(bytes: &[u8]) -> Result<String, DecodeError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| DecodeError::TextDecodeFailure)
}

/// Printable ASCII plus `\n`, `\r` and `\t`.
pub fn is_printable_text(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .all(|&b| (0x20..=0x7E).contains(&b) || matches!(b, b'\n' | b'\r' | b'\t'))
}

/// The text a buffer most likely carries, if every byte is printable.
pub fn printable_guess(bytes: &[u8]) -> Option<String> {
    if bytes.is_empty() || !is_printable_text(bytes) {
        return None;
    }
    decode_utf8(bytes).ok()
}

/// `[1, 2, 3]`, capped at `limit` bytes with a trailing `...`.
pub fn byte_list(bytes: &[u8], limit: usize) -> String {
    let shown: Vec<String> = bytes.iter().take(limit).map(u8::to_string).collect();
    let ellipsis = if bytes.len() > limit { "..." } else { "" };
    format!("[{}{}]", shown.join(", "), ellipsis)
}
