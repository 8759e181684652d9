//! Platform integration layer for mobile (iOS/Android) and desktop
//!
//! This module provides:
//! - Platform capability descriptor: which features a device offers
//! - Display metrics used to size rendered codes
//!
//! Platform code builds a `PlatformCapabilities` (or uses a preset) and
//! hands it to the share service; nothing here talks to the OS directly.

pub mod capabilities;

pub use capabilities::{DisplayMetrics, PlatformCapabilities, PlatformFeature, PlatformType};
