//! End-to-end share pipeline tests
//!
//! Encode on one "device", render to a bitmap, hand the wire string to a
//! second device with the same build key, decode.
//!
//! Run with: cargo test --test integration_share_roundtrip

use proptest::prelude::*;
use qrshare_core::crypto::{ShareKey, KEY_LEN};
use qrshare_core::payload::{self, SharedPayload};
use qrshare_core::store::PreferenceStore;
use qrshare_core::transform::{self, TransformError};
use qrshare_core::{PlatformCapabilities, Rgba, ShareError, ShareService, COULD_NOT_READ_CODE};
use std::sync::Arc;

fn device(key: ShareKey, caps: PlatformCapabilities) -> ShareService {
    ShareService::new(key, Arc::new(PreferenceStore::in_memory()), caps)
}

fn build_key() -> ShareKey {
    ShareKey::from_build_config().expect("build key")
}

#[tokio::test]
async fn test_android_to_ios_roundtrip() {
    let sender = device(build_key(), PlatformCapabilities::android());
    let receiver = device(build_key(), PlatformCapabilities::ios());

    let payload = SharedPayload::new("Meet at the café at 18:00 🦀");
    let form = sender.encode(&payload).await;
    let bitmap = sender
        .render(&form, Rgba::BLACK, Rgba::WHITE)
        .await
        .expect("render");
    assert!(bitmap.width > 0);

    let received = receiver.decode(form.as_str()).await.expect("decode");
    assert_eq!(received, payload);
}

#[tokio::test]
async fn test_plain_mode_both_sides() {
    let sender = device(build_key(), PlatformCapabilities::android());
    let receiver = device(build_key(), PlatformCapabilities::android());
    sender.set_encryption_enabled(false).await;
    receiver.set_encryption_enabled(false).await;

    let payload = SharedPayload::new("visible to any QR reader");
    let form = sender.encode(&payload).await;
    assert_eq!(form.as_str(), payload::serialize(&payload));
    assert_eq!(receiver.decode(form.as_str()).await.unwrap(), payload);
}

#[tokio::test]
async fn test_different_build_keys_cannot_read_each_other() {
    let sender = device(ShareKey::from_bytes([1u8; KEY_LEN]), PlatformCapabilities::android());
    let receiver = device(ShareKey::from_bytes([2u8; KEY_LEN]), PlatformCapabilities::android());
    assert_ne!(sender.key_fingerprint(), receiver.key_fingerprint());

    let form = sender.encode(&SharedPayload::new("private")).await;
    let err = receiver.decode(form.as_str()).await.unwrap_err();
    assert_eq!(err.user_message(), COULD_NOT_READ_CODE);
}

#[test]
fn test_concrete_test_string_scenario() {
    let key = build_key();
    let encoded = transform::encode("test_string", &key);

    assert_eq!(encoded.len() % 2, 0);
    assert!(encoded
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
    assert_eq!(transform::decode(&encoded, &key).unwrap(), "test_string");
}

#[test]
fn test_never_hex_encoded_input() {
    let result = transform::decode("not valid hex!", &build_key());
    assert!(matches!(result, Err(TransformError::Decoding(_))));
}

#[test]
fn test_decode_with_explicit_gate() {
    let service = device(build_key(), PlatformCapabilities::desktop());
    let payload = SharedPayload::new("gated");

    let encrypted = service.encode_with(&payload, true);
    let plain = service.encode_with(&payload, false);
    assert_ne!(encrypted, plain);

    assert_eq!(service.decode_with(encrypted.as_str(), true).unwrap(), payload);
    assert_eq!(service.decode_with(plain.as_str(), false).unwrap(), payload);
    assert!(matches!(
        service.decode_with(plain.as_str(), true),
        Err(ShareError::Transform(TransformError::Decoding(_)))
    ));
}

proptest! {
    #[test]
    fn prop_payload_roundtrip_through_service(message in "\\PC{0,400}") {
        let service = device(build_key(), PlatformCapabilities::desktop());
        let payload = SharedPayload::new(message);

        for encrypted in [true, false] {
            let form = service.encode_with(&payload, encrypted);
            prop_assert_eq!(service.decode_with(form.as_str(), encrypted).unwrap(), payload.clone());
        }
    }

    #[test]
    fn prop_encode_deterministic(message in "\\PC{0,200}") {
        let key = build_key();
        let serialized = payload::serialize(&SharedPayload::new(message));
        prop_assert_eq!(transform::encode(&serialized, &key), transform::encode(&serialized, &key));
    }
}
