//! Test utilities for integration tests.
//!
//! This module builds synthetic sprite sheets whose cells are filled with a
//! unique colour, so any slice can be traced back to the cell it came from.

use std::io::{Cursor, Read};
use std::time::Duration;

use bytes::Bytes;
use image::{ImageFormat, Rgba, RgbaImage};
use zip::ZipArchive;

use sprite_slicer::slice::{DebounceConfig, SlicerOptions};
use sprite_slicer::SourceImage;

// =============================================================================
// Sprite Sheets
// =============================================================================

/// Side of one fixture cell in pixels.
pub const CELL: u32 = 8;

/// Unique, opaque colour of the cell at `(row, column)`.
pub fn cell_color(row: u32, column: u32) -> Rgba<u8> {
    Rgba([(row * 30 + 10) as u8, (column * 30 + 10) as u8, 200, 255])
}

/// A `rows` x `columns` sheet of `CELL`-sized cells.
pub fn sprite_sheet(rows: u32, columns: u32) -> RgbaImage {
    RgbaImage::from_fn(columns * CELL, rows * CELL, |x, y| {
        cell_color(y / CELL, x / CELL)
    })
}

/// Same as [`sprite_sheet`] with a transparent border of `margin` pixels.
pub fn sprite_sheet_with_margin(rows: u32, columns: u32, margin: u32) -> RgbaImage {
    let inner = sprite_sheet(rows, columns);
    let mut sheet = RgbaImage::new(inner.width() + 2 * margin, inner.height() + 2 * margin);
    image::imageops::replace(&mut sheet, &inner, margin as i64, margin as i64);
    sheet
}

pub fn source(rows: u32, columns: u32) -> SourceImage {
    SourceImage::from_rgba(sprite_sheet(rows, columns))
}

// =============================================================================
// Codecs
// =============================================================================

/// Encode a raster as PNG bytes.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut output = Cursor::new(Vec::new());
    image.write_to(&mut output, ImageFormat::Png).unwrap();
    output.into_inner()
}

/// Decode PNG bytes back into a raster.
pub fn decode_png(data: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(data, ImageFormat::Png)
        .unwrap()
        .to_rgba8()
}

/// Whether every pixel of `image` is `color`.
pub fn is_filled_with(image: &RgbaImage, color: Rgba<u8>) -> bool {
    image.pixels().all(|p| *p == color)
}

/// Every entry of a zip archive as `(name, content)`, in archive order.
pub fn read_archive(archive: &Bytes) -> Vec<(String, Vec<u8>)> {
    let mut zip = ZipArchive::new(Cursor::new(archive.to_vec())).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut file = zip.by_index(i).unwrap();
            let mut data = Vec::new();
            file.read_to_end(&mut data).unwrap();
            (file.name().to_string(), data)
        })
        .collect()
}

// =============================================================================
// Pipeline
// =============================================================================

/// Timing fast enough for tests running on the real clock.
pub fn fast_options() -> SlicerOptions {
    SlicerOptions {
        debounce: DebounceConfig {
            idle_threshold: Duration::from_millis(20),
            short_delay: Duration::from_millis(2),
            long_delay: Duration::from_millis(5),
        },
        frame_interval: Duration::from_millis(1),
    }
}
