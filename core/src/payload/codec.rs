// Payload codec: canonical JSON form with a size guard for hostile input

use super::types::SharedPayload;
use thiserror::Error;

/// Largest serialized payload accepted by `parse`: 4 KB.
///
/// Applies to text read straight off a symbol (plain mode). A version 40
/// QR symbol holds at most 2953 bytes, so larger plain text cannot have
/// come out of a scan. Text recovered by inflating an encrypted code is
/// bounded by the inflate limit instead; use `parse_bounded` for it.
pub const MAX_SERIALIZED_SIZE: usize = 4 * 1024;

/// The serialized text does not follow the payload grammar
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedPayload {
    #[error("Serialized payload too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid payload structure: {0}")]
    Invalid(String),
}

/// Serialize a payload to its canonical string.
///
/// Compact JSON with a fixed field order, so the same payload always
/// yields the same text.
pub fn serialize(payload: &SharedPayload) -> String {
    // Serializing a single string field into an in-memory buffer cannot fail.
    serde_json::to_string(payload).unwrap_or_else(|_| unreachable!("payload serialization"))
}

/// Parse a canonical string read directly from a symbol
pub fn parse(serialized: &str) -> Result<SharedPayload, MalformedPayload> {
    parse_bounded(serialized, MAX_SERIALIZED_SIZE)
}

/// Parse a canonical string no longer than `max` bytes
pub fn parse_bounded(serialized: &str, max: usize) -> Result<SharedPayload, MalformedPayload> {
    if serialized.len() > max {
        return Err(MalformedPayload::TooLarge {
            size: serialized.len(),
            max,
        });
    }

    serde_json::from_str(serialized).map_err(|e| MalformedPayload::Invalid(e.to_string()))
}
