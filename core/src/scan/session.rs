//! Scan session state machine
//!
//! ```text
//! Idle → Scanning → Decoded(text) → Success(payload)
//!                 ↘               ↘ Failure(reason)
//!                   Failure(scan)
//! Success | Failure → Idle (dismiss) or → Scanning (start over)
//! ```
//!
//! The camera or gallery collaborator reports either a decoded string or a
//! `ScanFailure`. Only decoded strings go through the share pipeline; scan
//! failures never count as decode failures.

use crate::payload::SharedPayload;
use crate::platform::{PlatformCapabilities, PlatformFeature};
use crate::share::ShareService;
use crate::{ShareError, COULD_NOT_READ_CODE};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// ENUMS & TYPES
// ============================================================================

/// Where a code is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanSource {
    /// Live camera preview
    Camera,
    /// Image picked from the gallery
    Gallery,
}

impl ScanSource {
    fn required_feature(&self) -> PlatformFeature {
        match self {
            Self::Camera => PlatformFeature::CodeScanning,
            Self::Gallery => PlatformFeature::GalleryImport,
        }
    }
}

/// Failures reported by the scan collaborator itself
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanFailure {
    #[error("No code found")]
    NoCodeFound,

    #[error("Code could not be read")]
    MalformedCode,

    #[error("Camera unavailable")]
    CameraUnavailable,

    #[error("Camera permission denied")]
    PermissionDenied,
}

/// Why a scan round trip ended in failure
#[derive(Debug, Clone)]
pub enum FailureReason {
    /// The camera or gallery could not produce a string
    Scan(ScanFailure),
    /// A string was read but did not decode to a payload
    Decode(ShareError),
}

impl FailureReason {
    /// Text shown to the user. Every decode-path cause reads the same.
    pub fn user_message(&self) -> String {
        match self {
            Self::Scan(failure) => failure.to_string(),
            Self::Decode(_) => COULD_NOT_READ_CODE.to_string(),
        }
    }

    /// Whether the UI should offer a retry
    pub fn can_retry(&self) -> bool {
        !matches!(self, Self::Scan(ScanFailure::PermissionDenied))
    }
}

#[derive(Debug, Clone)]
pub enum ScanState {
    Idle,
    Scanning(ScanSource),
    Decoded(String),
    Success(SharedPayload),
    Failure(FailureReason),
}

impl ScanState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Scanning(_) => "Scanning",
            Self::Decoded(_) => "Decoded",
            Self::Success(_) => "Success",
            Self::Failure(_) => "Failure",
        }
    }
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Events that drive the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEvent {
    Start,
    CodeDecoded,
    ScanFailed,
    DecodeCompleted,
    Dismiss,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Cannot handle {event:?} in {from} state")]
    InvalidTransition { from: &'static str, event: ScanEvent },

    #[error("{0:?} scanning is not supported on this platform")]
    Unsupported(ScanSource),
}

// ============================================================================
// SCAN SESSION
// ============================================================================

/// One screen's scan round trip
pub struct ScanSession {
    state: ScanState,
    capabilities: Arc<PlatformCapabilities>,
}

impl ScanSession {
    pub fn new(capabilities: Arc<PlatformCapabilities>) -> Self {
        Self {
            state: ScanState::Idle,
            capabilities,
        }
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    fn invalid(&self, event: ScanEvent) -> ScanError {
        ScanError::InvalidTransition {
            from: self.state.name(),
            event,
        }
    }

    fn transition(&mut self, next: ScanState) -> &ScanState {
        debug!(from = self.state.name(), to = next.name(), "Scan session transition");
        self.state = next;
        &self.state
    }

    /// Begin scanning. Also starts over from a finished round trip.
    pub fn start(&mut self, source: ScanSource) -> Result<&ScanState, ScanError> {
        if !self.capabilities.supports(source.required_feature()) {
            return Err(ScanError::Unsupported(source));
        }

        match self.state {
            ScanState::Idle | ScanState::Success(_) | ScanState::Failure(_) => {
                Ok(self.transition(ScanState::Scanning(source)))
            }
            _ => Err(self.invalid(ScanEvent::Start)),
        }
    }

    /// The collaborator read a string from a frame or image.
    ///
    /// Readers often hand back a trailing newline or padding; it is dropped
    /// here so the decode path only sees the symbol's own text.
    pub fn on_scan_decoded(&mut self, text: impl Into<String>) -> Result<&ScanState, ScanError> {
        match self.state {
            ScanState::Scanning(_) => {
                let text = text.into().trim().to_string();
                Ok(self.transition(ScanState::Decoded(text)))
            }
            _ => Err(self.invalid(ScanEvent::CodeDecoded)),
        }
    }

    /// The collaborator could not produce a string
    pub fn on_scan_failed(&mut self, failure: ScanFailure) -> Result<&ScanState, ScanError> {
        match self.state {
            ScanState::Scanning(_) => {
                info!(%failure, "Scan failed");
                Ok(self.transition(ScanState::Failure(FailureReason::Scan(failure))))
            }
            _ => Err(self.invalid(ScanEvent::ScanFailed)),
        }
    }

    /// The text awaiting decode, if the session is in `Decoded`
    pub fn pending_text(&self) -> Option<&str> {
        match &self.state {
            ScanState::Decoded(text) => Some(text),
            _ => None,
        }
    }

    /// Apply the outcome of decoding the pending text
    pub fn complete_decode(
        &mut self,
        result: Result<SharedPayload, ShareError>,
    ) -> Result<&ScanState, ScanError> {
        if !matches!(self.state, ScanState::Decoded(_)) {
            return Err(self.invalid(ScanEvent::DecodeCompleted));
        }

        let next = match result {
            Ok(payload) => ScanState::Success(payload),
            Err(e) => ScanState::Failure(FailureReason::Decode(e)),
        };
        Ok(self.transition(next))
    }

    /// Decode the pending text through `service` and complete the round trip
    pub async fn resolve(&mut self, service: &ShareService) -> Result<&ScanState, ScanError> {
        let text = self
            .pending_text()
            .ok_or_else(|| self.invalid(ScanEvent::DecodeCompleted))?
            .to_string();

        let result = service.decode(&text).await;
        self.complete_decode(result)
    }

    /// Return to idle after the user saw the result
    pub fn dismiss(&mut self) -> Result<&ScanState, ScanError> {
        match self.state {
            ScanState::Success(_) | ScanState::Failure(_) => Ok(self.transition(ScanState::Idle)),
            _ => Err(self.invalid(ScanEvent::Dismiss)),
        }
    }

    /// Abandon whatever is in progress
    pub fn reset(&mut self) {
        self.transition(ScanState::Idle);
    }
}
