// Payload types: what the user actually shares

use serde::{Deserialize, Serialize};

/// The logical unit transferred through a QR code.
///
/// Immutable once built: editing the input field or completing a scan
/// produces a fresh value that replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SharedPayload {
    message: String,
}

impl SharedPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_message(self) -> String {
        self.message
    }

    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

impl From<String> for SharedPayload {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for SharedPayload {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl std::fmt::Display for SharedPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
