//! Source image handle.
//!
//! The host decodes the sprite sheet once; the pipeline only ever holds a
//! shared, read-only reference to the pixels. Cloning a [`SourceImage`] is a
//! reference-count bump, so the same raster can be handed to the worker for
//! a job while the preview keeps drawing it.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{ImageReader, RgbaImage};

use crate::error::SourceError;

/// A decoded, read-only RGBA raster.
#[derive(Clone)]
pub struct SourceImage {
    pixels: Arc<RgbaImage>,
}

impl SourceImage {
    /// Wrap an already decoded raster.
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
        }
    }

    /// Decode an encoded image (PNG or JPEG), guessing the format from its
    /// magic bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, SourceError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| SourceError::Decode {
                message: e.to_string(),
            })?;

        let decoded = reader.decode().map_err(|e| SourceError::Decode {
            message: e.to_string(),
        })?;

        let pixels = decoded.to_rgba8();
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(SourceError::Empty {
                width: pixels.width(),
                height: pixels.height(),
            });
        }

        Ok(Self::from_rgba(pixels))
    }

    /// Read and decode an image file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| SourceError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::decode(&bytes)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// The underlying pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Whether both handles point at the same decoded raster.
    pub fn same_as(&self, other: &SourceImage) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
