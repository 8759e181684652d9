// qrshare-mobile: Native mobile bindings for iOS and Android
// This crate exports the share pipeline via UniFFI

use futures::StreamExt;
use parking_lot::{Mutex, RwLock};
use qrshare_core::scan::{ScanError, ScanFailure, ScanSession, ScanSource, ScanState};
use qrshare_core::{
    qr, CodeImageError, DebouncedEncoder, DisplayMetrics, EncodedForm, ErrorCorrection,
    PlatformCapabilities, PreferenceStore, Preferences, Rgba, ShareError, ShareKey, ShareService,
    SharedPayload, COULD_NOT_READ_CODE,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::{Handle, Runtime};

uniffi::setup_scaffolding!();

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq, uniffi::Error)]
pub enum BridgeError {
    #[error("Could not read code")]
    CouldNotReadCode,
    #[error("Text does not fit in a QR code")]
    DataTooLong,
    #[error("Invalid share key")]
    InvalidKey,
    #[error("Storage error")]
    StorageError,
    #[error("Action not allowed in the current scan state")]
    InvalidState,
    #[error("Not supported on this platform")]
    Unsupported,
    #[error("Internal error")]
    Internal,
}

impl From<ShareError> for BridgeError {
    fn from(_err: ShareError) -> Self {
        BridgeError::CouldNotReadCode
    }
}

impl From<CodeImageError> for BridgeError {
    fn from(err: CodeImageError) -> Self {
        match err {
            CodeImageError::DataTooLong | CodeImageError::PayloadTooLarge { .. } => {
                BridgeError::DataTooLong
            }
            CodeImageError::Encoding(_) | CodeImageError::ImageTooLarge(_) => BridgeError::Internal,
        }
    }
}

impl From<ScanError> for BridgeError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::InvalidTransition { .. } => BridgeError::InvalidState,
            ScanError::Unsupported(_) => BridgeError::Unsupported,
        }
    }
}

// ============================================================================
// RUNTIME
// ============================================================================

static GLOBAL_RT: RwLock<Option<Runtime>> = RwLock::new(None);

/// Shared runtime for every bridge; foreign callers never run inside tokio
fn global_runtime() -> Result<Handle, BridgeError> {
    if let Some(rt) = &*GLOBAL_RT.read() {
        return Ok(rt.handle().clone());
    }

    let mut rt_write = GLOBAL_RT.write();
    if let Some(rt) = &*rt_write {
        return Ok(rt.handle().clone());
    }

    tracing::info!("Initializing global Tokio runtime for share bridge");
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("qrshare-worker")
        .build()
        .map_err(|e| {
            tracing::error!("Failed to create runtime: {}", e);
            BridgeError::Internal
        })?;
    let handle = rt.handle().clone();
    *rt_write = Some(rt);
    Ok(handle)
}

// ============================================================================
// RECORDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum MobilePlatform {
    Android,
    Ios,
}

#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct DisplayInfo {
    pub width_px: u32,
    pub height_px: u32,
    pub density: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct EncodedCode {
    pub text: String,
    pub encrypted: bool,
}

impl From<EncodedForm> for EncodedCode {
    fn from(form: EncodedForm) -> Self {
        let encrypted = form.is_encrypted();
        Self {
            text: form.into_string(),
            encrypted,
        }
    }
}

/// RGBA pixels ready for `Bitmap.copyPixelsFromBuffer` / `CGImage`
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct QrBitmap {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ScanInput {
    Camera,
    Gallery,
}

impl From<ScanInput> for ScanSource {
    fn from(input: ScanInput) -> Self {
        match input {
            ScanInput::Camera => ScanSource::Camera,
            ScanInput::Gallery => ScanSource::Gallery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum ScanProblem {
    NoCodeFound,
    MalformedCode,
    CameraUnavailable,
    PermissionDenied,
}

impl From<ScanProblem> for ScanFailure {
    fn from(problem: ScanProblem) -> Self {
        match problem {
            ScanProblem::NoCodeFound => ScanFailure::NoCodeFound,
            ScanProblem::MalformedCode => ScanFailure::MalformedCode,
            ScanProblem::CameraUnavailable => ScanFailure::CameraUnavailable,
            ScanProblem::PermissionDenied => ScanFailure::PermissionDenied,
        }
    }
}

/// What the scan screen should show
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum ScanView {
    Idle,
    Scanning,
    Decoding,
    Success { message: String },
    Failure { message: String, can_retry: bool },
}

impl From<&ScanState> for ScanView {
    fn from(state: &ScanState) -> Self {
        match state {
            ScanState::Idle => ScanView::Idle,
            ScanState::Scanning(_) => ScanView::Scanning,
            ScanState::Decoded(_) => ScanView::Decoding,
            ScanState::Success(payload) => ScanView::Success {
                message: payload.message().to_string(),
            },
            ScanState::Failure(reason) => ScanView::Failure {
                message: reason.user_message(),
                can_retry: reason.can_retry(),
            },
        }
    }
}

// ============================================================================
// CALLBACKS
// ============================================================================

/// Implemented by the platform to follow the encryption toggle
#[uniffi::export(with_foreign)]
pub trait PreferenceObserver: Send + Sync {
    fn on_encryption_changed(&self, enabled: bool);
}

/// Implemented by the platform to receive debounced encode results
#[uniffi::export(with_foreign)]
pub trait EncodeListener: Send + Sync {
    fn on_encoded(&self, code: EncodedCode);
}

// ============================================================================
// SHARE BRIDGE
// ============================================================================

#[derive(uniffi::Object)]
pub struct ShareBridge {
    service: Arc<ShareService>,
    rt: Handle,
    session: Mutex<ScanSession>,
    live: Mutex<Option<DebouncedEncoder>>,
}

#[uniffi::export]
impl ShareBridge {
    /// Create a bridge. `storage_path` of `None` keeps preferences in memory.
    #[uniffi::constructor]
    pub fn new(
        platform: MobilePlatform,
        display: DisplayInfo,
        storage_path: Option<String>,
    ) -> Result<Arc<Self>, BridgeError> {
        let prefs = match storage_path {
            Some(path) => PreferenceStore::open(&path).map_err(|e| {
                tracing::error!("Failed to open preference store: {}", e);
                BridgeError::StorageError
            })?,
            None => PreferenceStore::in_memory(),
        };
        let key = ShareKey::from_build_config().map_err(|_| BridgeError::InvalidKey)?;
        Self::build(platform, display, key, Arc::new(prefs))
    }

    pub fn key_fingerprint(&self) -> String {
        self.service.key_fingerprint()
    }

    // ------------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------------

    pub fn is_encryption_enabled(&self) -> bool {
        self.rt.block_on(self.service.encryption_enabled())
    }

    pub fn set_encryption_enabled(&self, enabled: bool) {
        self.rt.block_on(self.service.set_encryption_enabled(enabled))
    }

    /// 0 = L, 1 = M, 2 = Q, 3 = H
    pub fn error_correction_level(&self) -> u8 {
        self.rt.block_on(self.service.error_correction()).index() as u8
    }

    pub fn set_error_correction_level(&self, level: u8) {
        let level = ErrorCorrection::from_index(i32::from(level));
        self.rt.block_on(self.service.set_error_correction(level))
    }

    /// Call `observer` with the current encryption flag and on every change
    pub fn observe_encryption(&self, observer: Arc<dyn PreferenceObserver>) {
        let mut flags = self.service.observe_encryption_enabled();
        self.rt.spawn(async move {
            while let Some(enabled) = flags.next().await {
                observer.on_encryption_changed(enabled);
            }
        });
    }

    // ------------------------------------------------------------------------
    // Encode / render
    // ------------------------------------------------------------------------

    /// Encode text; fails when the result could not be read back
    pub fn encode(&self, message: String) -> Result<EncodedCode, BridgeError> {
        let payload = SharedPayload::new(message);
        let form = self.rt.block_on(self.service.encode(&payload));
        form.ensure_decodable()?;
        Ok(form.into())
    }

    /// Render an encoded string; colors are `0xAARRGGBB`
    pub fn render(
        &self,
        code: EncodedCode,
        foreground_argb: u32,
        background_argb: u32,
    ) -> Result<QrBitmap, BridgeError> {
        let options = self.rt.block_on(self.service.render_options());
        let bitmap = qr::render::render_with(
            &code.text,
            argb_to_rgba(foreground_argb),
            argb_to_rgba(background_argb),
            &options,
        )?;
        Ok(QrBitmap {
            width: bitmap.width,
            height: bitmap.height,
            pixels: bitmap.pixels,
        })
    }

    /// Start debounced encoding; results go to `listener`
    pub fn start_live(&self, listener: Arc<dyn EncodeListener>, debounce_ms: u32) {
        let _guard = self.rt.enter();
        let encoder =
            DebouncedEncoder::spawn(self.service.clone(), Duration::from_millis(debounce_ms.into()));
        let mut results = encoder.subscribe();

        self.rt.spawn(async move {
            while results.changed().await.is_ok() {
                let latest = results.borrow_and_update().clone();
                if let Some(form) = latest {
                    match form.ensure_decodable() {
                        Ok(()) => listener.on_encoded(form.into()),
                        Err(e) => tracing::warn!("Skipping live code: {}", e),
                    }
                }
            }
        });

        if let Some(previous) = self.live.lock().replace(encoder) {
            self.rt.spawn(previous.close());
        }
    }

    /// Feed the newest text to the live encoder
    pub fn push_live(&self, message: String) -> Result<(), BridgeError> {
        let live = self.live.lock();
        let encoder = live.as_ref().ok_or(BridgeError::InvalidState)?;
        encoder.push(SharedPayload::new(message));
        Ok(())
    }

    /// Flush any pending text and stop live encoding
    pub fn stop_live(&self) -> Option<EncodedCode> {
        let encoder = self.live.lock().take()?;
        self.rt.block_on(encoder.close()).map(EncodedCode::from)
    }

    // ------------------------------------------------------------------------
    // Decode / scan
    // ------------------------------------------------------------------------

    pub fn decode(&self, wire: String) -> Result<String, BridgeError> {
        let payload = self.rt.block_on(self.service.decode(&wire))?;
        Ok(payload.into_message())
    }

    pub fn start_scan(&self, input: ScanInput) -> Result<ScanView, BridgeError> {
        let mut session = self.session.lock();
        Ok(ScanView::from(session.start(input.into())?))
    }

    /// Hand over a string read from a code; decodes it and returns the result
    pub fn on_scan_decoded(&self, text: String) -> Result<ScanView, BridgeError> {
        let mut session = self.session.lock();
        session.on_scan_decoded(text)?;
        let state = self.rt.block_on(session.resolve(&self.service))?;
        Ok(ScanView::from(state))
    }

    pub fn on_scan_failed(&self, problem: ScanProblem) -> Result<ScanView, BridgeError> {
        let mut session = self.session.lock();
        Ok(ScanView::from(session.on_scan_failed(problem.into())?))
    }

    pub fn dismiss_scan(&self) -> Result<ScanView, BridgeError> {
        let mut session = self.session.lock();
        Ok(ScanView::from(session.dismiss()?))
    }

    pub fn scan_view(&self) -> ScanView {
        ScanView::from(self.session.lock().state())
    }

    /// Message shown for any unreadable code
    pub fn could_not_read_message(&self) -> String {
        COULD_NOT_READ_CODE.to_string()
    }
}

impl ShareBridge {
    fn build(
        platform: MobilePlatform,
        display: DisplayInfo,
        key: ShareKey,
        prefs: Arc<dyn Preferences>,
    ) -> Result<Arc<Self>, BridgeError> {
        let mut capabilities = match platform {
            MobilePlatform::Android => PlatformCapabilities::android(),
            MobilePlatform::Ios => PlatformCapabilities::ios(),
        };
        capabilities.display = DisplayMetrics::new(display.width_px, display.height_px, display.density);

        let service = ShareService::new(key, prefs, capabilities);
        let session = ScanSession::new(Arc::new(service.capabilities().clone()));

        Ok(Arc::new(Self {
            service: Arc::new(service),
            rt: global_runtime()?,
            session: Mutex::new(session),
            live: Mutex::new(None),
        }))
    }
}

fn argb_to_rgba(argb: u32) -> Rgba {
    let [a, r, g, b] = argb.to_be_bytes();
    Rgba { r, g, b, a }
}
