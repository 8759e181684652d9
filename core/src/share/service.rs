//! Share service bound to a key, a preference store and a platform

use super::form::EncodedForm;
use crate::crypto::ShareKey;
use crate::payload::{self, SharedPayload};
use crate::platform::PlatformCapabilities;
use crate::qr::{self, Bitmap, CodeImageError, ErrorCorrection, RenderOptions, Rgba};
use crate::store::{Preferences, ENCRYPTED_SHARE, QR_ERROR_CORRECTION};
use crate::transform::{TransformStage, MAX_INFLATED_SIZE};
use crate::ShareError;
use futures::stream::BoxStream;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point platform code creates once and shares between screens
pub struct ShareService {
    transform: TransformStage,
    prefs: Arc<dyn Preferences>,
    capabilities: Arc<PlatformCapabilities>,
}

impl ShareService {
    pub fn new(
        key: ShareKey,
        prefs: Arc<dyn Preferences>,
        capabilities: PlatformCapabilities,
    ) -> Self {
        Self {
            transform: TransformStage::new(key),
            prefs,
            capabilities: Arc::new(capabilities),
        }
    }

    pub fn capabilities(&self) -> &PlatformCapabilities {
        &self.capabilities
    }

    pub fn key_fingerprint(&self) -> String {
        self.transform.key_fingerprint()
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    pub async fn encryption_enabled(&self) -> bool {
        self.prefs
            .get_bool(ENCRYPTED_SHARE.name(), ENCRYPTED_SHARE.default_value())
            .await
    }

    pub async fn set_encryption_enabled(&self, enabled: bool) {
        self.prefs.set_bool(ENCRYPTED_SHARE.name(), enabled).await;
    }

    pub fn observe_encryption_enabled(&self) -> BoxStream<'static, bool> {
        self.prefs
            .observe_bool(ENCRYPTED_SHARE.name(), ENCRYPTED_SHARE.default_value())
    }

    pub async fn error_correction(&self) -> ErrorCorrection {
        let index = self
            .prefs
            .get_int(QR_ERROR_CORRECTION.name(), QR_ERROR_CORRECTION.default_value())
            .await;
        ErrorCorrection::from_index(index)
    }

    pub async fn set_error_correction(&self, level: ErrorCorrection) {
        self.prefs
            .set_int(QR_ERROR_CORRECTION.name(), level.index())
            .await;
    }

    // ------------------------------------------------------------------------
    // Encode
    // ------------------------------------------------------------------------

    /// Encode with an explicit gate, bypassing the preference store
    pub fn encode_with(&self, payload: &SharedPayload, encrypted: bool) -> EncodedForm {
        let serialized = payload::serialize(payload);
        let serialized_len = serialized.len();
        if encrypted {
            EncodedForm::new(self.transform.encode(&serialized), true, serialized_len)
        } else {
            EncodedForm::new(serialized, false, serialized_len)
        }
    }

    /// Encode using the current `encryptedShare` preference
    pub async fn encode(&self, payload: &SharedPayload) -> EncodedForm {
        let encrypted = self.encryption_enabled().await;
        self.encode_with(payload, encrypted)
    }

    // ------------------------------------------------------------------------
    // Decode
    // ------------------------------------------------------------------------

    /// Decode with an explicit gate, on the calling thread
    pub fn decode_with(&self, wire: &str, encrypted: bool) -> Result<SharedPayload, ShareError> {
        decode_wire(&self.transform, wire, encrypted)
    }

    /// Decode a scanned string using the current `encryptedShare` preference.
    ///
    /// The work runs on the blocking pool since its cost grows with the
    /// payload size.
    pub async fn decode(&self, wire: &str) -> Result<SharedPayload, ShareError> {
        let encrypted = self.encryption_enabled().await;
        let transform = self.transform.clone();
        let wire = wire.to_string();

        tokio::task::spawn_blocking(move || decode_wire(&transform, &wire, encrypted))
            .await
            .map_err(|e| ShareError::Worker(e.to_string()))?
    }

    // ------------------------------------------------------------------------
    // Render
    // ------------------------------------------------------------------------

    /// Render options for this platform's display and the user's
    /// error-correction preference
    pub async fn render_options(&self) -> RenderOptions {
        RenderOptions::for_display(&self.capabilities.display)
            .with_error_correction(self.error_correction().await)
    }

    /// Render a form as a QR bitmap.
    ///
    /// Forms whose payload the decode path would refuse are rejected here,
    /// so nothing is shown that cannot be read back.
    pub async fn render(
        &self,
        form: &EncodedForm,
        foreground: Rgba,
        background: Rgba,
    ) -> Result<Bitmap, CodeImageError> {
        form.ensure_decodable()?;
        let options = self.render_options().await;
        qr::render::render_with(form.as_str(), foreground, background, &options)
    }
}

fn decode_wire(
    transform: &TransformStage,
    wire: &str,
    encrypted: bool,
) -> Result<SharedPayload, ShareError> {
    let result = if encrypted {
        transform
            .decode(wire)
            .map_err(ShareError::from)
            .and_then(|serialized| {
                payload::parse_bounded(&serialized, MAX_INFLATED_SIZE).map_err(ShareError::from)
            })
    } else {
        payload::parse(wire).map_err(ShareError::from)
    };

    match &result {
        Ok(payload) => debug!(encrypted, len = payload.message().len(), "Decoded shared payload"),
        Err(e) => warn!(encrypted, error = %e, "Could not decode scanned code"),
    }
    result
}
