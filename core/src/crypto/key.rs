// Share key: process-wide constant injected into the transform stage
//
// The key is compiled in. Set QRSHARE_SHARE_KEY (32 hex chars) at build
// time to give a build its own key; every device that should read the
// codes must run a build with the same value.

use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-128 key length, which is also the CBC block (and IV) length
pub const KEY_LEN: usize = 16;

/// Key used when the build does not provide QRSHARE_SHARE_KEY
const DEFAULT_KEY_HEX: &str = "71727368617265206b65792076302031";

/// Key compiled into this build, if any
const BUILD_KEY_HEX: Option<&str> = option_env!("QRSHARE_SHARE_KEY");

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Share key is not valid hex: {0}")]
    InvalidHex(String),

    #[error("Share key must be {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

/// Fixed symmetric key shared by every build that should interoperate.
///
/// The same bytes serve as AES key and CBC initialization vector, so equal
/// plaintexts always produce equal ciphertexts.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ShareKey([u8; KEY_LEN]);

impl ShareKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidLength(bytes.len()))?;
        Ok(Self(array))
    }

    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let mut bytes =
            hex::decode(hex_key.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// The key this build was compiled with
    pub fn from_build_config() -> Result<Self, KeyError> {
        Self::from_hex(BUILD_KEY_HEX.unwrap_or(DEFAULT_KEY_HEX))
    }

    /// Whether the build supplied its own key instead of the built-in default
    pub fn is_build_override() -> bool {
        BUILD_KEY_HEX.is_some()
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Short SHA-256 fingerprint (first 8 bytes, hex).
    ///
    /// Lets two devices confirm they share a key without showing it.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..8])
    }
}

impl std::fmt::Debug for ShareKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShareKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
