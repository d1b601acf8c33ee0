//! Raster primitives for the overlay.
//!
//! Coordinates are device pixels as `f32`; spans are rounded to whole pixels
//! and never collapse below one pixel, so a 1px stroke stays visible.
//! Everything is clipped to the canvas.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use super::overlay::{DashPattern, DeviceRect};

/// Round `[start, end)` to a pixel span `(first, len)`.
fn pixel_span(start: f32, end: f32) -> Option<(i32, u32)> {
    if start.is_nan() || end.is_nan() || end <= start {
        return None;
    }
    let first = start.round();
    let last = end.round().max(first + 1.0);
    Some((first as i32, (last - first) as u32))
}

/// Fill the device-space rectangle `[x0, x1) x [y0, y1)`.
pub(crate) fn fill_rect(
    canvas: &mut RgbaImage,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    color: Rgba<u8>,
) {
    let (Some((x, width)), Some((y, height))) = (pixel_span(x0, x1), pixel_span(y0, y1)) else {
        return;
    };
    draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(width, height), color);
}

/// Stroke the inside edge of `rect` with rounded corners.
pub(crate) fn stroke_rounded_rect(
    canvas: &mut RgbaImage,
    rect: DeviceRect,
    radius: f32,
    stroke: f32,
    color: Rgba<u8>,
) {
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    let radius = radius.max(0.0);

    // Straight edges run from (x0, y0) to (x1, y1)
    let (x0, y0) = (left + radius, top + radius);
    let (x1, y1) = (right - radius, bottom - radius);

    fill_rect(canvas, x0, top, x1, top + stroke, color);
    fill_rect(canvas, x0, bottom - stroke, x1, bottom, color);
    fill_rect(canvas, left, y0, left + stroke, y1, color);
    fill_rect(canvas, right - stroke, y0, right, y1, color);

    if radius <= 0.0 {
        return;
    }

    // Top-left of each corner box and the centre of its arc
    let corners = [
        (left, top, x0, y0),
        (x1, top, x1, y0),
        (left, y1, x0, y1),
        (x1, y1, x1, y1),
    ];
    let inner = (radius - stroke).max(0.0);

    for (bx, by, cx, cy) in corners {
        let (Some((px, width)), Some((py, height))) =
            (pixel_span(bx, bx + radius), pixel_span(by, by + radius))
        else {
            continue;
        };
        for y in py..py + height as i32 {
            for x in px..px + width as i32 {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance >= inner && distance <= radius {
                    put_pixel(canvas, x, y, color);
                }
            }
        }
    }
}

/// Dashed vertical line at `x`, running from `top` to `bottom`.
pub(crate) fn dashed_vertical(
    canvas: &mut RgbaImage,
    x: f32,
    top: f32,
    bottom: f32,
    stroke: f32,
    pattern: &DashPattern,
    color: Rgba<u8>,
) {
    let half = stroke / 2.0;
    for (start, end) in pattern.segments(bottom - top) {
        fill_rect(canvas, x - half, top + start, x + half, top + end, color);
    }
}

/// Dashed horizontal line at `y`, running from `left` to `right`.
pub(crate) fn dashed_horizontal(
    canvas: &mut RgbaImage,
    y: f32,
    left: f32,
    right: f32,
    stroke: f32,
    pattern: &DashPattern,
    color: Rgba<u8>,
) {
    let half = stroke / 2.0;
    for (start, end) in pattern.segments(right - left) {
        fill_rect(canvas, left + start, y - half, left + end, y + half, color);
    }
}

fn put_pixel(canvas: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < canvas.width() && (y as u32) < canvas.height() {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

// =============================================================================
// Tests
// =============================================================================
