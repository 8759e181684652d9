//! Scan round trip against the share service and preference store
//!
//! Run with: cargo test --test integration_scan_flow

use futures::StreamExt;
use qrshare_core::crypto::{ShareKey, KEY_LEN};
use qrshare_core::scan::{FailureReason, ScanFailure, ScanSession, ScanSource, ScanState};
use qrshare_core::store::{PreferenceStore, Preferences, ENCRYPTED_SHARE};
use qrshare_core::{PlatformCapabilities, SharedPayload, ShareService, COULD_NOT_READ_CODE};
use std::sync::Arc;
use tempfile::tempdir;

fn service_with(prefs: Arc<PreferenceStore>) -> ShareService {
    ShareService::new(
        ShareKey::from_bytes([0x11; KEY_LEN]),
        prefs,
        PlatformCapabilities::android(),
    )
}

#[tokio::test]
async fn test_scan_decode_dismiss_cycle() {
    let service = service_with(Arc::new(PreferenceStore::in_memory()));
    let form = service.encode(&SharedPayload::new("round trip")).await;
    let mut session = ScanSession::new(Arc::new(service.capabilities().clone()));

    session.start(ScanSource::Camera).unwrap();
    session.on_scan_decoded(form.as_str()).unwrap();
    let state = session.resolve(&service).await.unwrap();
    assert!(matches!(state, ScanState::Success(p) if p.message() == "round trip"));

    session.dismiss().unwrap();
    assert!(matches!(session.state(), ScanState::Idle));
}

#[tokio::test]
async fn test_tampered_code_then_retry() {
    let service = service_with(Arc::new(PreferenceStore::in_memory()));
    let form = service.encode(&SharedPayload::new("retry me")).await;

    let mut tampered = form.as_str().to_string();
    let last = if tampered.ends_with('0') { "1" } else { "0" };
    tampered.replace_range(tampered.len() - 1.., last);

    let mut session = ScanSession::new(Arc::new(service.capabilities().clone()));
    session.start(ScanSource::Camera).unwrap();
    session.on_scan_decoded(tampered).unwrap();

    match session.resolve(&service).await.unwrap() {
        ScanState::Failure(reason @ FailureReason::Decode(_)) => {
            assert_eq!(reason.user_message(), COULD_NOT_READ_CODE);
            assert!(reason.can_retry());
        }
        other => panic!("expected decode failure, got {}", other),
    }

    session.start(ScanSource::Camera).unwrap();
    session.on_scan_decoded(form.as_str()).unwrap();
    assert!(matches!(
        session.resolve(&service).await.unwrap(),
        ScanState::Success(_)
    ));
}

#[tokio::test]
async fn test_camera_failure_skips_decode() {
    let service = service_with(Arc::new(PreferenceStore::in_memory()));
    let mut session = ScanSession::new(Arc::new(service.capabilities().clone()));

    session.start(ScanSource::Camera).unwrap();
    session.on_scan_failed(ScanFailure::CameraUnavailable).unwrap();

    // Nothing to decode after a scan failure
    assert!(session.resolve(&service).await.is_err());
    assert!(matches!(
        session.state(),
        ScanState::Failure(FailureReason::Scan(ScanFailure::CameraUnavailable))
    ));
}

#[tokio::test]
async fn test_encryption_toggle_persists_and_notifies() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("prefs");
    let path = path.to_str().unwrap();

    {
        let prefs = Arc::new(PreferenceStore::open(path).unwrap());
        let service = service_with(prefs.clone());
        let mut flags = service.observe_encryption_enabled();
        assert_eq!(flags.next().await, Some(true));

        service.set_encryption_enabled(false).await;
        assert_eq!(flags.next().await, Some(false));
        assert!(!prefs.get_bool(ENCRYPTED_SHARE.name(), true).await);
    }

    let prefs = Arc::new(PreferenceStore::open(path).unwrap());
    let service = service_with(prefs);
    assert!(!service.encryption_enabled().await);

    let form = service.encode(&SharedPayload::new("after restart")).await;
    assert!(!form.is_encrypted());
}
