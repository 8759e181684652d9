//! Platform capability descriptor
//!
//! A static snapshot of what the host device can do. The scan path is only
//! offered when the platform reports `PlatformFeature::CodeScanning`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================================================
// ENUMS & TYPES
// ============================================================================

/// Platform type for capability reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformType {
    /// Android devices
    Android,
    /// iOS devices
    IOS,
    /// Desktop/laptop (macOS, Linux, Windows)
    Desktop,
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Android => write!(f, "Android"),
            Self::IOS => write!(f, "iOS"),
            Self::Desktop => write!(f, "Desktop"),
        }
    }
}

/// Optional features a platform may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlatformFeature {
    /// Live camera scanning of codes
    CodeScanning,
    /// Reading codes from images picked from the gallery
    GalleryImport,
    /// Wallpaper-derived color schemes
    DynamicColor,
    /// System share sheet
    ShareSheet,
}

/// Screen size in physical pixels plus density
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub width_px: u32,
    pub height_px: u32,
    /// Physical pixels per density-independent pixel
    pub density: f32,
}

impl DisplayMetrics {
    pub fn new(width_px: u32, height_px: u32, density: f32) -> Self {
        Self {
            width_px,
            height_px,
            density,
        }
    }

    pub fn shortest_side_px(&self) -> u32 {
        self.width_px.min(self.height_px)
    }

    /// Convert density-independent pixels to physical pixels
    pub fn dp_to_px(&self, dp: f32) -> u32 {
        (dp * self.density).round().max(0.0) as u32
    }
}

impl Default for DisplayMetrics {
    fn default() -> Self {
        Self::new(1080, 1920, 2.625)
    }
}

// ============================================================================
// CAPABILITIES
// ============================================================================

/// What the host platform offers the share pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Platform type
    pub platform: PlatformType,
    /// Supported optional features
    pub features: BTreeSet<PlatformFeature>,
    /// Display metrics of the primary screen
    pub display: DisplayMetrics,
}

impl PlatformCapabilities {
    pub fn new(platform: PlatformType, display: DisplayMetrics) -> Self {
        Self {
            platform,
            features: BTreeSet::new(),
            display,
        }
    }

    /// Create capabilities for Android
    pub fn android() -> Self {
        Self::new(PlatformType::Android, DisplayMetrics::default())
            .with_feature(PlatformFeature::CodeScanning)
            .with_feature(PlatformFeature::GalleryImport)
            .with_feature(PlatformFeature::DynamicColor)
            .with_feature(PlatformFeature::ShareSheet)
    }

    /// Create capabilities for iOS
    pub fn ios() -> Self {
        Self::new(PlatformType::IOS, DisplayMetrics::new(1170, 2532, 3.0))
            .with_feature(PlatformFeature::CodeScanning)
            .with_feature(PlatformFeature::GalleryImport)
            .with_feature(PlatformFeature::ShareSheet)
    }

    /// Create capabilities for desktop (no camera scanning)
    pub fn desktop() -> Self {
        Self::new(PlatformType::Desktop, DisplayMetrics::new(1920, 1080, 1.0))
            .with_feature(PlatformFeature::GalleryImport)
    }

    pub fn with_feature(mut self, feature: PlatformFeature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn without_feature(mut self, feature: PlatformFeature) -> Self {
        self.features.remove(&feature);
        self
    }

    pub fn supports(&self, feature: PlatformFeature) -> bool {
        self.features.contains(&feature)
    }

    /// Whether any scan path (camera or gallery) should be offered
    pub fn can_scan(&self) -> bool {
        self.supports(PlatformFeature::CodeScanning) || self.supports(PlatformFeature::GalleryImport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_preset() {
        let caps = PlatformCapabilities::android();
        assert_eq!(caps.platform, PlatformType::Android);
        assert!(caps.supports(PlatformFeature::CodeScanning));
        assert!(caps.supports(PlatformFeature::DynamicColor));
    }

    #[test]
    fn test_ios_preset_has_no_dynamic_color() {
        let caps = PlatformCapabilities::ios();
        assert!(caps.supports(PlatformFeature::CodeScanning));
        assert!(!caps.supports(PlatformFeature::DynamicColor));
    }

    #[test]
    fn test_desktop_preset_has_no_camera() {
        let caps = PlatformCapabilities::desktop();
        assert!(!caps.supports(PlatformFeature::CodeScanning));
        assert!(caps.can_scan());
    }

    #[test]
    fn test_without_feature() {
        let caps = PlatformCapabilities::desktop().without_feature(PlatformFeature::GalleryImport);
        assert!(!caps.can_scan());
    }

    #[test]
    fn test_display_metrics() {
        let display = DisplayMetrics::new(1080, 2400, 2.5);
        assert_eq!(display.shortest_side_px(), 1080);
        assert_eq!(display.dp_to_px(100.0), 250);
    }

    #[test]
    fn test_platform_type_display() {
        assert_eq!(format!("{}", PlatformType::Android), "Android");
        assert_eq!(format!("{}", PlatformType::IOS), "iOS");
        assert_eq!(format!("{}", PlatformType::Desktop), "Desktop");
    }
}
