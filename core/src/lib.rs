// QR Share Core: text in, QR code out, and back again
//
// Everything the share screen needs below the UI: payload codec, the
// compress+encrypt transform, QR rendering, the scan round trip, typed
// preferences and platform capabilities.

pub mod crypto;
pub mod payload;
pub mod platform;
pub mod qr;
pub mod scan;
pub mod share;
pub mod store;
pub mod transform;

use thiserror::Error;

pub use crypto::ShareKey;
pub use payload::{MalformedPayload, SharedPayload};
pub use platform::{DisplayMetrics, PlatformCapabilities, PlatformFeature, PlatformType};
pub use qr::{Bitmap, CodeImageAdapter, CodeImageError, ErrorCorrection, RenderOptions, Rgba};
pub use scan::{FailureReason, ScanFailure, ScanSession, ScanSource, ScanState};
pub use share::{DebouncedEncoder, EncodedForm, ShareService};
pub use store::{PreferenceStore, Preferences};
pub use transform::{TransformError, TransformStage};

/// The single message shown for any code that scanned but did not decode
pub const COULD_NOT_READ_CODE: &str = "Could not read code";

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Decode-path failure of the share pipeline
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShareError {
    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("Malformed payload: {0}")]
    Payload(#[from] MalformedPayload),

    #[error("Decode worker failed: {0}")]
    Worker(String),
}

impl ShareError {
    /// What the user sees. Every cause collapses to the same retryable message.
    pub fn user_message(&self) -> &'static str {
        COULD_NOT_READ_CODE
    }
}
