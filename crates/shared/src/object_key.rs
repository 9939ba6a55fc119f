//! Object key decoding for storage event notifications.
//!
//! Storage events deliver object keys form-urlencoded: spaces arrive as `+`
//! and reserved characters as `%XX` escapes.

use percent_encoding::percent_decode_str;
use thiserror::Error;

/// Errors produced while decoding an object key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ObjectKeyError {
    #[error("Object key is not valid UTF-8 after decoding: {0}")]
    InvalidUtf8(String),

    #[error("Malformed escape sequence in object key: {0}")]
    MalformedEscape(String),
}

/// Decodes a form-urlencoded object key.
pub fn decode_object_key(raw: &str) -> Result<String, ObjectKeyError> {
    if has_malformed_escape(raw) {
        return Err(ObjectKeyError::MalformedEscape(raw.to_string()));
    }

    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ObjectKeyError::InvalidUtf8(raw.to_string()))
}

/// A `%` must be followed by two hex digits.
fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.iter().enumerate().any(|(i, b)| {
        *b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}
