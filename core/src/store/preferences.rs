//! Typed user preferences with push-based change notification
//!
//! Values are stored through a `StorageBackend` under a `pref:` prefix and
//! published on a per-key `watch` channel, so every observer sees the
//! current value on subscribe and each later change.

use super::backend::{MemoryStorage, SledStorage, StorageBackend, StorageError};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

const KEY_PREFIX: &str = "pref:";

// ============================================================================
// KEYS & VALUES
// ============================================================================

/// A named preference together with its default value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceKey<T> {
    name: &'static str,
    default: T,
}

impl<T: Copy> PreferenceKey<T> {
    pub const fn new(name: &'static str, default: T) -> Self {
        Self { name, default }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn default_value(&self) -> T {
        self.default
    }
}

/// Whether shared codes are compressed and encrypted
pub const ENCRYPTED_SHARE: PreferenceKey<bool> = PreferenceKey::new("encryptedShare", true);

/// QR error-correction level index (0 = L, 1 = M, 2 = Q, 3 = H)
pub const QR_ERROR_CORRECTION: PreferenceKey<i32> = PreferenceKey::new("qrErrorCorrection", 1);

/// A stored preference value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferenceValue {
    Bool(bool),
    Int(i32),
}

impl std::fmt::Display for PreferenceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// PREFERENCES TRAIT
// ============================================================================

/// Asynchronous key-value preferences with typed accessors.
///
/// Writes are fire-and-forget: a failed write is logged by the
/// implementation and never surfaces to the UI.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Preferences: Send + Sync {
    async fn get_bool(&self, key: &str, default: bool) -> bool;
    async fn get_int(&self, key: &str, default: i32) -> i32;
    async fn set_bool(&self, key: &str, value: bool);
    async fn set_int(&self, key: &str, value: i32);

    /// Current value followed by every change
    fn observe_bool(&self, key: &str, default: bool) -> BoxStream<'static, bool>;
    /// Current value followed by every change
    fn observe_int(&self, key: &str, default: i32) -> BoxStream<'static, i32>;
}

// ============================================================================
// PREFERENCE STORE
// ============================================================================

/// `Preferences` over any storage backend
pub struct PreferenceStore {
    backend: Arc<dyn StorageBackend>,
    watchers: Mutex<HashMap<String, watch::Sender<Option<PreferenceValue>>>>,
}

impl PreferenceStore {
    pub fn with_backend(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryStorage::new()))
    }

    /// Open (or create) an on-disk store
    pub fn open(path: &str) -> Result<Self, StorageError> {
        Ok(Self::with_backend(Arc::new(SledStorage::open(path)?)))
    }

    fn storage_key(key: &str) -> Vec<u8> {
        format!("{}{}", KEY_PREFIX, key).into_bytes()
    }

    /// Read a raw value; unreadable entries are treated as unset
    pub fn load(&self, key: &str) -> Option<PreferenceValue> {
        match self.try_load(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Ignoring unreadable preference");
                None
            }
        }
    }

    fn try_load(&self, key: &str) -> Result<Option<PreferenceValue>, StorageError> {
        let Some(bytes) = self.backend.get(&Self::storage_key(key))? else {
            return Ok(None);
        };
        bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|_| StorageError::Corrupt(key.to_string()))
    }

    /// Store a value and notify observers of `key`
    pub fn store(&self, key: &str, value: PreferenceValue) -> Result<(), StorageError> {
        let bytes = bincode::serialize(&value).map_err(|e| StorageError::Io(e.to_string()))?;

        let watchers = self.watchers.lock();
        self.backend.put(&Self::storage_key(key), &bytes)?;
        self.backend.flush()?;

        if let Some(sender) = watchers.get(key) {
            sender.send_if_modified(|current| {
                if *current == Some(value) {
                    false
                } else {
                    *current = Some(value);
                    true
                }
            });
        }
        Ok(())
    }

    /// Forget a stored value; observers see the default again
    pub fn reset(&self, key: &str) -> Result<(), StorageError> {
        let watchers = self.watchers.lock();
        self.backend.remove(&Self::storage_key(key))?;
        self.backend.flush()?;

        if let Some(sender) = watchers.get(key) {
            sender.send_if_modified(|current| current.take().is_some());
        }
        Ok(())
    }

    /// Every stored preference, sorted by name
    pub fn list(&self) -> Result<Vec<(String, PreferenceValue)>, StorageError> {
        let mut entries = Vec::new();
        for (k, v) in self.backend.scan_prefix(KEY_PREFIX.as_bytes())? {
            let name = String::from_utf8_lossy(&k[KEY_PREFIX.len()..]).into_owned();
            match bincode::deserialize::<PreferenceValue>(&v) {
                Ok(value) => entries.push((name, value)),
                Err(_) => warn!(key = %name, "Skipping corrupt preference"),
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    fn subscribe(&self, key: &str) -> watch::Receiver<Option<PreferenceValue>> {
        let mut watchers = self.watchers.lock();
        if let Some(sender) = watchers.get(key) {
            return sender.subscribe();
        }

        let (sender, receiver) = watch::channel(self.load(key));
        watchers.insert(key.to_string(), sender);
        receiver
    }

    fn write_logged(&self, key: &str, value: PreferenceValue) {
        if let Err(e) = self.store(key, value) {
            warn!(key, error = %e, "Preference write failed");
        }
    }
}

#[async_trait]
impl Preferences for PreferenceStore {
    async fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.load(key) {
            Some(PreferenceValue::Bool(v)) => v,
            _ => default,
        }
    }

    async fn get_int(&self, key: &str, default: i32) -> i32 {
        match self.load(key) {
            Some(PreferenceValue::Int(v)) => v,
            _ => default,
        }
    }

    async fn set_bool(&self, key: &str, value: bool) {
        self.write_logged(key, PreferenceValue::Bool(value));
    }

    async fn set_int(&self, key: &str, value: i32) {
        self.write_logged(key, PreferenceValue::Int(value));
    }

    fn observe_bool(&self, key: &str, default: bool) -> BoxStream<'static, bool> {
        WatchStream::new(self.subscribe(key))
            .map(move |value| match value {
                Some(PreferenceValue::Bool(v)) => v,
                _ => default,
            })
            .boxed()
    }

    fn observe_int(&self, key: &str, default: i32) -> BoxStream<'static, i32> {
        WatchStream::new(self.subscribe(key))
            .map(move |value| match value {
                Some(PreferenceValue::Int(v)) => v,
                _ => default,
            })
            .boxed()
    }
}
