// Transform stage: hex(AES-CBC(deflate(text))) and back

use super::compress::{self, CompressError};
use super::TransformError;
use crate::crypto::{self, ShareKey};
use tracing::debug;

/// Encode serialized text into its encrypted wire form.
///
/// Total and deterministic: the same text and key always give the same
/// even-length lowercase hex string.
pub fn encode(serialized: &str, key: &ShareKey) -> String {
    let compressed = compress::deflate(serialized.as_bytes());
    let ciphertext = crypto::encrypt(key, &compressed);

    debug!(
        plain_len = serialized.len(),
        compressed_len = compressed.len(),
        cipher_len = ciphertext.len(),
        "Transform encode"
    );

    hex::encode(ciphertext)
}

/// Decode a wire string produced by `encode` with the same key.
///
/// The input must be exactly the hex text `encode` produced. Whitespace is
/// not hex and is rejected here; scanners strip it at the scan boundary.
pub fn decode(encoded: &str, key: &ShareKey) -> Result<String, TransformError> {
    let ciphertext =
        hex::decode(encoded).map_err(|e| TransformError::Decoding(e.to_string()))?;
    let compressed = crypto::decrypt(key, &ciphertext)?;
    let plain = compress::inflate(&compressed)?;

    String::from_utf8(plain).map_err(|_| TransformError::Decompression(CompressError::InvalidUtf8))
}

/// Transform stage bound to the build's share key
#[derive(Debug, Clone)]
pub struct TransformStage {
    key: ShareKey,
}

impl TransformStage {
    pub fn new(key: ShareKey) -> Self {
        Self { key }
    }

    pub fn key_fingerprint(&self) -> String {
        self.key.fingerprint()
    }

    pub fn encode(&self, serialized: &str) -> String {
        encode(serialized, &self.key)
    }

    pub fn decode(&self, encoded: &str) -> Result<String, TransformError> {
        decode(encoded, &self.key)
    }
}
