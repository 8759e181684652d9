//! Transform stage: reversible compress + encrypt for the optical channel
//!
//! Encode: UTF-8 bytes → zlib deflate → AES-128-CBC/PKCS#7 → lowercase hex.
//! Decode runs the same steps backwards and reports which step rejected
//! the input. Every rejection is a clean error; foreign or tampered input
//! never comes back as silently wrong text.

pub mod compress;
pub mod stage;

pub use compress::{deflate, inflate, CompressError, MAX_INFLATED_SIZE};
pub use stage::{decode, encode, TransformStage};

use crate::crypto::CipherError;
use thiserror::Error;

/// Why a wire string could not be turned back into serialized text
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("Invalid hex encoding: {0}")]
    Decoding(String),

    #[error("Decryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error("Decompression failed: {0}")]
    Decompression(#[from] CompressError),
}
