// Bitmap and color types handed to the UI layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// Parse `#rrggbb` or `#rrggbbaa` (leading `#` optional)
    pub fn from_hex(s: &str) -> Result<Self, ImageError> {
        let digits = s.trim().trim_start_matches('#');
        let bytes = hex::decode(digits).map_err(|_| ImageError::InvalidColor(s.to_string()))?;

        match bytes.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            [r, g, b, a] => Ok(Self {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            }),
            _ => Err(ImageError::InvalidColor(s.to_string())),
        }
    }

    /// `#rrggbb`, dropping alpha
    pub fn to_hex_rgb(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Image could not be decoded: {0}")]
    Undecodable(String),
}

/// Row-major RGBA bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, RGBA per pixel
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// A bitmap filled with one color
    pub fn filled(width: u32, height: u32, color: Rgba) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&color.to_array());
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some(Rgba {
            r: self.pixels[i],
            g: self.pixels[i + 1],
            b: self.pixels[i + 2],
            a: self.pixels[i + 3],
        })
    }

    /// Paint a filled square; parts outside the bitmap are clipped
    pub fn fill_square(&mut self, x: u32, y: u32, size: u32, color: Rgba) {
        let rgba = color.to_array();
        let x_end = x.saturating_add(size).min(self.width);
        let y_end = y.saturating_add(size).min(self.height);

        for py in y..y_end {
            let row = py as usize * self.width as usize;
            for px in x..x_end {
                let i = (row + px as usize) * 4;
                self.pixels[i..i + 4].copy_from_slice(&rgba);
            }
        }
    }
}

/// Platform-native decoding of encoded image bytes (PNG, JPEG, ...)
/// into a bitmap. Implemented by the host graphics stack.
#[cfg_attr(test, mockall::automock)]
pub trait ImageDecoder: Send + Sync {
    fn bytes_to_image(&self, bytes: &[u8]) -> Result<Bitmap, ImageError>;
}
