// Wire form of a shared payload

use serde::{Deserialize, Serialize};

use crate::payload::MAX_SERIALIZED_SIZE;
use crate::qr::CodeImageError;
use crate::transform::MAX_INFLATED_SIZE;

/// Longest serialized payload the decode path will accept back.
///
/// Plain text is read straight off the symbol; encrypted text is bounded
/// by what inflate will produce.
pub fn max_serialized_len(encrypted: bool) -> usize {
    if encrypted {
        MAX_INFLATED_SIZE
    } else {
        MAX_SERIALIZED_SIZE
    }
}

/// Printable string embedded in the QR symbol.
///
/// Lowercase hex when encrypted, otherwise the plain serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncodedForm {
    text: String,
    encrypted: bool,
    serialized_len: usize,
}

impl EncodedForm {
    pub(crate) fn new(text: String, encrypted: bool, serialized_len: usize) -> Self {
        Self {
            text,
            encrypted,
            serialized_len,
        }
    }

    /// Length of the serialized payload before compression and encryption
    pub fn serialized_len(&self) -> usize {
        self.serialized_len
    }

    /// Refuse forms a scanner could read but the decode path would reject
    pub fn ensure_decodable(&self) -> Result<(), CodeImageError> {
        let max = max_serialized_len(self.encrypted);
        if self.serialized_len > max {
            return Err(CodeImageError::PayloadTooLarge {
                size: self.serialized_len,
                max,
            });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl std::fmt::Display for EncodedForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for EncodedForm {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_decodable_per_mode() {
        let plain = EncodedForm::new("x".into(), false, MAX_SERIALIZED_SIZE + 1);
        assert!(matches!(
            plain.ensure_decodable(),
            Err(CodeImageError::PayloadTooLarge { max: MAX_SERIALIZED_SIZE, .. })
        ));

        // Compression lets encrypted payloads run well past the plain limit
        let encrypted = EncodedForm::new("ab".into(), true, MAX_SERIALIZED_SIZE + 1);
        assert!(encrypted.ensure_decodable().is_ok());

        let encrypted = EncodedForm::new("ab".into(), true, MAX_INFLATED_SIZE + 1);
        assert!(encrypted.ensure_decodable().is_err());
    }
}
