//! Code image adapter: printable strings to QR bitmaps
//!
//! Rendering is pure and deterministic: the same text, colors and options
//! always give the same pixels. Reading codes back out of camera frames is
//! platform work; decoded strings enter the core through the scan session.

pub mod image;
pub mod render;

pub use image::{Bitmap, ImageDecoder, ImageError, Rgba};
pub use render::{
    render, render_svg, render_terminal, CodeImageAdapter, CodeImageError, ErrorCorrection,
    RenderOptions, Scale, UnknownLevel, MAX_IMAGE_SIDE_PX, QUIET_ZONE_MODULES,
};
