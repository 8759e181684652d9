//! Share service: the full text ⇄ QR pipeline
//!
//! Wires the payload codec, the transform stage and the code image adapter
//! to the user's preferences:
//!
//! ```text
//! encode: SharedPayload → serialize → [deflate → AES-CBC → hex] → EncodedForm → QR bitmap
//! decode: scanned text  → [hex → AES-CBC → inflate] → parse → SharedPayload
//! ```
//!
//! The bracketed steps run only while the `encryptedShare` preference is on.

pub mod debounce;
pub mod form;
pub mod service;

pub use debounce::{next_settled, DebouncedEncoder, DEFAULT_DEBOUNCE};
pub use form::{max_serialized_len, EncodedForm};
pub use service::ShareService;
