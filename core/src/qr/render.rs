// QR rendering: symbol encoding via the qrcode crate, pixels painted here

use super::image::{Bitmap, Rgba};
use crate::platform::DisplayMetrics;
use qrcode::render::{svg, unicode};
use qrcode::types::QrError;
use qrcode::{Color as Module, EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Light border around the symbol, in modules, as required by the QR standard
pub const QUIET_ZONE_MODULES: u32 = 4;

/// Largest bitmap or SVG side, in pixels
pub const MAX_IMAGE_SIDE_PX: u32 = 8192;

/// Fraction of the shorter screen side a fitted code should span
const FIT_FRACTION: f32 = 0.7;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodeImageError {
    #[error("Text does not fit in a QR symbol at this error-correction level")]
    DataTooLong,

    #[error("QR encoding failed: {0}")]
    Encoding(String),

    #[error("Image side of {0} px exceeds {MAX_IMAGE_SIDE_PX} px")]
    ImageTooLarge(u64),

    #[error("Payload of {size} bytes could not be decoded back (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl From<QrError> for CodeImageError {
    fn from(err: QrError) -> Self {
        match err {
            QrError::DataTooLong => CodeImageError::DataTooLong,
            other => CodeImageError::Encoding(other.to_string()),
        }
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

/// QR error-correction level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery
    Low,
    /// ~15% recovery
    #[default]
    Medium,
    /// ~25% recovery
    Quartile,
    /// ~30% recovery
    High,
}

impl ErrorCorrection {
    /// Map the stored preference value (0..=3); out-of-range values fall back to Medium
    pub fn from_index(index: i32) -> Self {
        match index {
            0 => Self::Low,
            1 => Self::Medium,
            2 => Self::Quartile,
            3 => Self::High,
            _ => Self::default(),
        }
    }

    pub fn index(&self) -> i32 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::Quartile => 2,
            Self::High => 3,
        }
    }

    fn ec_level(&self) -> EcLevel {
        match self {
            Self::Low => EcLevel::L,
            Self::Medium => EcLevel::M,
            Self::Quartile => EcLevel::Q,
            Self::High => EcLevel::H,
        }
    }
}

impl std::fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "L"),
            Self::Medium => write!(f, "M"),
            Self::Quartile => write!(f, "Q"),
            Self::High => write!(f, "H"),
        }
    }
}

impl std::str::FromStr for ErrorCorrection {
    type Err = UnknownLevel;

    /// Accepts a level letter (`L`, `M`, `Q`, `H`) or its index
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "0" => Ok(Self::Low),
            "M" | "1" => Ok(Self::Medium),
            "Q" | "2" => Ok(Self::Quartile),
            "H" | "3" => Ok(Self::High),
            _ => Err(UnknownLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown error-correction level: {0}")]
pub struct UnknownLevel(pub String);

/// How large each module is painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    /// Fixed module size in pixels
    ModulePx(u32),
    /// Largest whole-pixel module size whose image fits the given side length
    FitPx(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub error_correction: ErrorCorrection,
    pub scale: Scale,
    pub quiet_zone: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::Medium,
            scale: Scale::ModulePx(8),
            quiet_zone: true,
        }
    }
}

impl RenderOptions {
    /// Options sized to span most of the shorter side of the screen
    pub fn for_display(display: &DisplayMetrics) -> Self {
        let side = (display.shortest_side_px() as f32 * FIT_FRACTION) as u32;
        Self {
            scale: Scale::FitPx(side.max(1)),
            ..Self::default()
        }
    }

    pub fn with_error_correction(mut self, error_correction: ErrorCorrection) -> Self {
        self.error_correction = error_correction;
        self
    }

    fn module_px(&self, modules_across: u32) -> u32 {
        match self.scale {
            Scale::ModulePx(px) => px.max(1),
            Scale::FitPx(side) => (side / modules_across.max(1)).max(1),
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Pixel geometry of a rendered symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    border: u32,
    module_px: u32,
    side: u32,
}

impl Layout {
    fn new(symbol_width: u32, options: &RenderOptions) -> Result<Self, CodeImageError> {
        let border = if options.quiet_zone {
            QUIET_ZONE_MODULES
        } else {
            0
        };
        let modules_across = symbol_width + 2 * border;
        let module_px = options.module_px(modules_across);
        let side = u64::from(modules_across) * u64::from(module_px);
        if side > u64::from(MAX_IMAGE_SIDE_PX) {
            return Err(CodeImageError::ImageTooLarge(side));
        }
        Ok(Self {
            border,
            module_px,
            side: side as u32,
        })
    }
}

fn encode_symbol(text: &str, error_correction: ErrorCorrection) -> Result<QrCode, CodeImageError> {
    Ok(QrCode::with_error_correction_level(
        text.as_bytes(),
        error_correction.ec_level(),
    )?)
}

/// Render `text` as a QR bitmap with the given colors and default options
pub fn render(text: &str, foreground: Rgba, background: Rgba) -> Result<Bitmap, CodeImageError> {
    render_with(text, foreground, background, &RenderOptions::default())
}

/// Render `text` as a QR bitmap
pub fn render_with(
    text: &str,
    foreground: Rgba,
    background: Rgba,
    options: &RenderOptions,
) -> Result<Bitmap, CodeImageError> {
    let code = encode_symbol(text, options.error_correction)?;
    let symbol_width = code.width() as u32;
    let Layout {
        border,
        module_px,
        side,
    } = Layout::new(symbol_width, options)?;

    let mut bitmap = Bitmap::filled(side, side, background);
    for (i, module) in code.to_colors().into_iter().enumerate() {
        if module == Module::Dark {
            let x = (i as u32 % symbol_width + border) * module_px;
            let y = (i as u32 / symbol_width + border) * module_px;
            bitmap.fill_square(x, y, module_px, foreground);
        }
    }

    Ok(bitmap)
}

/// Render `text` as dense unicode half-blocks for a terminal
pub fn render_terminal(text: &str, error_correction: ErrorCorrection) -> Result<String, CodeImageError> {
    let code = encode_symbol(text, error_correction)?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Dark)
        .light_color(unicode::Dense1x2::Light)
        .quiet_zone(true)
        .build())
}

/// Render `text` as an SVG document
pub fn render_svg(
    text: &str,
    foreground: Rgba,
    background: Rgba,
    options: &RenderOptions,
) -> Result<String, CodeImageError> {
    let code = encode_symbol(text, options.error_correction)?;
    let dark = foreground.to_hex_rgb();
    let light = background.to_hex_rgb();
    let module_px = Layout::new(code.width() as u32, options)?.module_px;

    Ok(code
        .render::<svg::Color>()
        .quiet_zone(options.quiet_zone)
        .module_dimensions(module_px, module_px)
        .dark_color(svg::Color(&dark))
        .light_color(svg::Color(&light))
        .build())
}

/// Stateful adapter holding the render options a screen uses
#[derive(Debug, Clone, Default)]
pub struct CodeImageAdapter {
    options: RenderOptions,
}

impl CodeImageAdapter {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn for_display(display: &DisplayMetrics) -> Self {
        Self::new(RenderOptions::for_display(display))
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_error_correction(&mut self, error_correction: ErrorCorrection) {
        self.options.error_correction = error_correction;
    }

    pub fn render(
        &self,
        text: &str,
        foreground: Rgba,
        background: Rgba,
    ) -> Result<Bitmap, CodeImageError> {
        render_with(text, foreground, background, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_correction_parse() {
        assert_eq!("h".parse::<ErrorCorrection>(), Ok(ErrorCorrection::High));
        assert_eq!("0".parse::<ErrorCorrection>(), Ok(ErrorCorrection::Low));
        assert_eq!(" Q ".parse::<ErrorCorrection>(), Ok(ErrorCorrection::Quartile));
        assert!("X".parse::<ErrorCorrection>().is_err());
        assert!("4".parse::<ErrorCorrection>().is_err());
    }

    #[test]
    fn test_render_dimensions() {
        // "test_string" fits in a version 1 symbol (21 modules) at level M
        let bitmap = render("test_string", Rgba::BLACK, Rgba::WHITE).unwrap();
        let expected = (21 + 2 * QUIET_ZONE_MODULES) * 8;

        assert_eq!(bitmap.width, expected);
        assert_eq!(bitmap.height, expected);
        assert_eq!(bitmap.pixels.len(), (expected * expected * 4) as usize);
    }

    #[test]
    fn test_render_uses_colors() {
        let fg = Rgba::rgb(0x10, 0x20, 0x30);
        let bg = Rgba::rgb(0xF0, 0xE0, 0xD0);
        let bitmap = render("colors", fg, bg).unwrap();

        // Quiet zone corner is background; finder pattern corner is foreground
        assert_eq!(bitmap.pixel(0, 0), Some(bg));
        let finder = QUIET_ZONE_MODULES * 8;
        assert_eq!(bitmap.pixel(finder, finder), Some(fg));
    }

    #[test]
    fn test_render_deterministic() {
        let a = render("same text", Rgba::BLACK, Rgba::WHITE).unwrap();
        let b = render("same text", Rgba::BLACK, Rgba::WHITE).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_without_quiet_zone() {
        let options = RenderOptions {
            quiet_zone: false,
            scale: Scale::ModulePx(1),
            ..RenderOptions::default()
        };
        let bitmap = render_with("abc", Rgba::BLACK, Rgba::WHITE, &options).unwrap();
        assert_eq!(bitmap.width, 21);
        assert_eq!(bitmap.pixel(0, 0), Some(Rgba::BLACK));
    }

    #[test]
    fn test_render_rejects_oversized_image() {
        let options = RenderOptions {
            scale: Scale::ModulePx(u32::MAX),
            ..RenderOptions::default()
        };
        let expected = u64::from(21 + 2 * QUIET_ZONE_MODULES) * u64::from(u32::MAX);

        assert_eq!(
            render_with("abc", Rgba::BLACK, Rgba::WHITE, &options),
            Err(CodeImageError::ImageTooLarge(expected))
        );
        assert_eq!(
            render_svg("abc", Rgba::BLACK, Rgba::WHITE, &options),
            Err(CodeImageError::ImageTooLarge(expected))
        );
    }

    #[test]
    fn test_render_fit_to_display() {
        let display = DisplayMetrics::new(1000, 2000, 2.0);
        let adapter = CodeImageAdapter::for_display(&display);
        let bitmap = adapter.render("fit me", Rgba::BLACK, Rgba::WHITE).unwrap();

        assert!(bitmap.width <= 700);
        // 29 modules across at 24 px each
        assert_eq!(bitmap.width, 29 * 24);
    }

    #[test]
    fn test_render_long_hex_payload() {
        let text = "0123456789abcdef".repeat(16);
        assert!(render(&text, Rgba::BLACK, Rgba::WHITE).is_ok());
    }

    #[test]
    fn test_render_too_long() {
        let text = "x".repeat(4000);
        assert_eq!(
            render(&text, Rgba::BLACK, Rgba::WHITE),
            Err(CodeImageError::DataTooLong)
        );
    }

    #[test]
    fn test_render_terminal() {
        let out = render_terminal("hello", ErrorCorrection::Low).unwrap();
        assert!(out.lines().count() > 10);
    }

    #[test]
    fn test_render_svg_colors() {
        let svg = render_svg(
            "hello",
            Rgba::rgb(0xAA, 0, 0),
            Rgba::WHITE,
            &RenderOptions::default(),
        )
        .unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("#aa0000"));
    }

    #[test]
    fn test_render_svg_matches_bitmap_size() {
        for quiet_zone in [true, false] {
            let options = RenderOptions {
                quiet_zone,
                scale: Scale::FitPx(500),
                ..RenderOptions::default()
            };
            let bitmap = render_with("fit me", Rgba::BLACK, Rgba::WHITE, &options).unwrap();
            let svg = render_svg("fit me", Rgba::BLACK, Rgba::WHITE, &options).unwrap();

            assert!(
                svg.contains(&format!("width=\"{}\"", bitmap.width)),
                "quiet_zone={quiet_zone}: {svg:.200}"
            );
        }
    }

    #[test]
    fn test_error_correction_index_roundtrip() {
        for ec in [
            ErrorCorrection::Low,
            ErrorCorrection::Medium,
            ErrorCorrection::Quartile,
            ErrorCorrection::High,
        ] {
            assert_eq!(ErrorCorrection::from_index(ec.index()), ec);
        }
        assert_eq!(ErrorCorrection::from_index(42), ErrorCorrection::Medium);
    }

    #[test]
    fn test_higher_error_correction_grows_symbol() {
        let text = "a moderately long string to push the symbol version up";
        let low = RenderOptions {
            scale: Scale::ModulePx(1),
            ..RenderOptions::default()
        }
        .with_error_correction(ErrorCorrection::Low);
        let high = low.with_error_correction(ErrorCorrection::High);

        let a = render_with(text, Rgba::BLACK, Rgba::WHITE, &low).unwrap();
        let b = render_with(text, Rgba::BLACK, Rgba::WHITE, &high).unwrap();
        assert!(b.width > a.width);
    }
}
