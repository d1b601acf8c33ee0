//! Cell cropping and PNG encoding.
//!
//! # Design Decisions
//!
//! - **No clamping**: a crop rectangle may extend past the source image. The
//!   part that overlaps the image is copied, everything else stays fully
//!   transparent. A cell entirely outside the image is a blank PNG.
//!
//! - **Lossless output**: cells are always PNG encoded at their native size.
//!
//! - **Degrade, don't fail**: if a cell cannot be encoded the encoder falls
//!   back to a blank cell of the same size. Only when the blank cell fails
//!   too does the worker give up on the job.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, RgbaImage};
use tracing::warn;

use crate::error::EncodeError;
use crate::geometry::CellRect;

/// Copy the pixels of `rect` out of `source`.
///
/// The output is always `rect.width` x `rect.height`; pixels outside the
/// source are transparent.
pub fn crop_cell(source: &RgbaImage, rect: CellRect) -> RgbaImage {
    let mut cell = RgbaImage::new(rect.width, rect.height);
    imageops::replace(&mut cell, source, -rect.x, -rect.y);
    cell
}

/// Produces the encoded bytes of one cell.
///
/// The worker is generic over this so a job can be driven by any encoder.
pub trait CellEncoder: Send + Sync {
    /// Crop `rect` out of `source` and encode it.
    fn encode_cell(&self, source: &RgbaImage, rect: CellRect) -> Result<Bytes, EncodeError>;
}

/// PNG encoder for cropped cells.
#[derive(Debug, Clone, Default)]
pub struct PngSliceEncoder {}

impl PngSliceEncoder {
    pub fn new() -> Self {
        Self {}
    }

    /// Encode `cell` as PNG.
    pub fn encode(&self, cell: &RgbaImage) -> Result<Bytes, EncodeError> {
        let mut output = Vec::new();
        PngEncoder::new(&mut output)
            .write_image(
                cell.as_raw(),
                cell.width(),
                cell.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| EncodeError::Png {
                message: e.to_string(),
            })?;
        Ok(Bytes::from(output))
    }
}

impl CellEncoder for PngSliceEncoder {
    /// Falls back to a blank cell when encoding the crop fails.
    fn encode_cell(&self, source: &RgbaImage, rect: CellRect) -> Result<Bytes, EncodeError> {
        let cell = crop_cell(source, rect);
        self.encode(&cell).or_else(|e| {
            warn!(x = rect.x, y = rect.y, error = %e, "Cell encode failed, using blank cell");
            self.encode(&RgbaImage::new(rect.width, rect.height))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
