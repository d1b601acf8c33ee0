//! Overlay geometry in device pixels.
//!
//! Everything the preview draws on top of the image is computed here from a
//! [`GridSpec`] and a device pixel ratio: logical coordinates are multiplied
//! by the ratio once, so the drawing code only sees device pixels.

use crate::geometry::GridSpec;

/// Dash length in logical pixels.
pub const DASH_LENGTH: f32 = 8.0;

/// Gap between dashes in logical pixels.
pub const DASH_GAP: f32 = 8.0;

/// Phase advance per frame in logical pixels.
pub const DASH_STEP: f32 = 0.2;

/// Corner radius of the outer border in logical pixels.
pub const BORDER_RADIUS: f32 = 20.0;

/// Stroke width of every overlay line in logical pixels.
pub const STROKE_WIDTH: f32 = 1.0;

/// An axis-aligned rectangle in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DeviceRect {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Where the border and the interior grid lines go.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayGeometry {
    /// Outer bound of the grid
    pub bounds: DeviceRect,

    /// Border corner radius, at most half the shorter side
    pub radius: f32,

    pub stroke_width: f32,

    /// X position of every interior vertical line
    pub vertical: Vec<f32>,

    /// Y position of every interior horizontal line
    pub horizontal: Vec<f32>,
}

impl OverlayGeometry {
    /// Scale `grid` to device pixels. A void grid has no overlay.
    pub fn compute(grid: &GridSpec, device_pixel_ratio: f32) -> Option<Self> {
        let bounds = grid.bounds()?;
        let dpr = device_pixel_ratio;

        let bounds = DeviceRect {
            x: bounds.x as f32 * dpr,
            y: bounds.y as f32 * dpr,
            width: bounds.width as f32 * dpr,
            height: bounds.height as f32 * dpr,
        };
        let radius = (BORDER_RADIUS * dpr).min(bounds.width.min(bounds.height) / 2.0);

        let cell_width = grid.cell_width as f32 * dpr;
        let cell_height = grid.cell_height as f32 * dpr;
        let vertical = (1..grid.columns)
            .map(|column| bounds.x + column as f32 * cell_width)
            .collect();
        let horizontal = (1..grid.rows)
            .map(|row| bounds.y + row as f32 * cell_height)
            .collect();

        Some(Self {
            bounds,
            radius,
            stroke_width: STROKE_WIDTH * dpr,
            vertical,
            horizontal,
        })
    }
}

// =============================================================================
// Dashes
// =============================================================================

/// A dash pattern shifted by a phase, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPattern {
    pub dash: f32,
    pub gap: f32,
    pub phase: f32,
}

impl DashPattern {
    pub fn period(&self) -> f32 {
        self.dash + self.gap
    }

    /// Visible `(start, end)` spans along a line of `length`.
    ///
    /// Dashes start at `-phase + k * period`; spans are clipped to
    /// `[0, length]`.
    pub fn segments(&self, length: f32) -> Vec<(f32, f32)> {
        let period = self.period();
        if length <= 0.0 || self.dash <= 0.0 || period <= 0.0 {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut start = -self.phase.rem_euclid(period);
        while start < length {
            let end = (start + self.dash).min(length);
            if end > 0.0 {
                segments.push((start.max(0.0), end));
            }
            start += period;
        }
        segments
    }
}

/// Animation state of the interior lines.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarchingAnts {
    phase: f32,
}

impl MarchingAnts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current dash phase in device pixels.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Move the dashes one frame forward.
    pub fn advance(&mut self, device_pixel_ratio: f32) {
        let period = (DASH_LENGTH + DASH_GAP) * device_pixel_ratio;
        self.phase = (self.phase + DASH_STEP * device_pixel_ratio) % period;
    }

    /// The dash pattern for the current frame.
    pub fn pattern(&self, device_pixel_ratio: f32) -> DashPattern {
        DashPattern {
            dash: DASH_LENGTH * device_pixel_ratio,
            gap: DASH_GAP * device_pixel_ratio,
            phase: self.phase,
        }
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}

// =============================================================================
// Tests
// =============================================================================
