//! Common types for Retrofx.
//!
//! This crate defines the shared data model used by the effect engine and
//! the `retrofx` command line tool: the canonical [`PixelBuffer`] image
//! representation, the per-effect option records, RGBA color parsing, and
//! the structured [`RenderError`] type.
//!
//! # Pixel format
//!
//! Every image boundary in Retrofx uses the same format: packed 8-bit RGBA,
//! row-major, top-to-bottom rows, un-premultiplied alpha. A buffer is valid
//! iff `data.len() == width * height * 4`.
//!
//! # Examples
//!
//! ```
//! use common::{CrtOptions, PixelBuffer};
//!
//! let buf = PixelBuffer::filled(2, 2, [255, 0, 0, 255]);
//! assert_eq!(buf.data.len(), 16);
//!
//! // Missing option fields always resolve to documented defaults.
//! let opts = CrtOptions::default();
//! assert_eq!(opts.scale, 3);
//! ```

use serde::{Deserialize, Serialize};

pub mod color;
pub mod error;
pub mod options;

pub use color::Rgba;
pub use error::RenderError;
pub use options::{CrtOptions, HexOptions, HexOrientation, XbrzOptions};

/// The three pixel-art transformation effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    /// Barrel distortion, scanlines and shadow mask compositing.
    Crt,
    /// Hexagonal-cell remapping with optional cell borders.
    Hex,
    /// Edge-directed xBRZ-style upscaling.
    Xbrz,
}

impl EffectKind {
    /// All effect kinds, in stable order. Used to index per-kind resource
    /// slots.
    pub const ALL: [EffectKind; 3] = [EffectKind::Crt, EffectKind::Hex, EffectKind::Xbrz];

    /// Stable index of this kind within [`EffectKind::ALL`].
    pub fn index(self) -> usize {
        match self {
            EffectKind::Crt => 0,
            EffectKind::Hex => 1,
            EffectKind::Xbrz => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Crt => "crt",
            EffectKind::Hex => "hex",
            EffectKind::Xbrz => "xbrz",
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Canonical RGBA8 image buffer.
///
/// Value object: produced once, never mutated through shared state.
/// Ownership of a render result transfers to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Packed RGBA8 bytes, row-major, top-to-bottom.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl PixelBuffer {
    /// Wrap existing RGBA8 bytes, validating the size invariant.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self, RenderError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Allocate a buffer filled with a single RGBA color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; width as usize * height as usize * 4];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self {
            data,
            width,
            height,
        }
    }

    /// Allocate a fully transparent buffer.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// RGBA value of the pixel at `(x, y)`. Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Write the pixel at `(x, y)`. Panics if out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }
}
