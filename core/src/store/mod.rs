// Store module: key-value persistence and typed user preferences

pub mod backend;
pub mod preferences;

pub use backend::{MemoryStorage, SledStorage, StorageBackend, StorageError};
pub use preferences::{
    PreferenceKey, PreferenceStore, PreferenceValue, Preferences, ENCRYPTED_SHARE,
    QR_ERROR_CORRECTION,
};
