//! Text normalization helpers
//!
//! The portal declares its responses as ISO-8859-1 while actually serving
//! UTF-8 bytes, so any text decoded per the declared charset arrives
//! mojibake'd ("FÃ­sico" instead of "Físico"). Every extracted field goes
//! through [`normalize_encoding`] immediately after extraction; encoding
//! logic lives here and nowhere else.

use regex::Regex;
use std::sync::OnceLock;

/// Reinterpret a Latin-1-decoded string as the UTF-8 it really is.
///
/// Re-encodes the string to its original single bytes and re-decodes them
/// as UTF-8. The reinterpretation is applied only when it is provably the
/// right call: every char fits in one byte, the byte run is valid UTF-8,
/// and at least one multi-byte sequence is present. Plain ASCII and already
/// correct accented text pass through unchanged.
pub fn normalize_encoding(input: &str) -> String {
    let mut bytes = Vec::with_capacity(input.len());
    for ch in input.chars() {
        let code = ch as u32;
        if code > 0xFF {
            // Already genuine multi-byte text, nothing to reinterpret.
            return input.to_string();
        }
        bytes.push(code as u8);
    }

    if bytes.iter().all(u8::is_ascii) {
        return input.to_string();
    }

    match String::from_utf8(bytes) {
        Ok(decoded) => decoded,
        // The single-byte form is not UTF-8, so the input was real Latin-1
        // range text decoded correctly in the first place.
        Err(_) => input.to_string(),
    }
}

/// Decode a raw response body: UTF-8 when valid, Latin-1 otherwise.
pub fn decode_body(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Collapse an extracted field: normalize encoding, then trim.
pub fn clean_field(input: &str) -> String {
    normalize_encoding(input).trim().to_string()
}

/// Remove every whitespace run from a string (origin-number blocks arrive
/// littered with newlines and tabs between the digits).
pub fn strip_whitespace(input: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let ws = WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    ws.replace_all(input, "").into_owned()
}
