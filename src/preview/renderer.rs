//! Two-layer preview renderer.
//!
//! # Layers
//!
//! ```text
//!   (image, grid, theme, surface) ──▶ static layer    rebuilt only when the key changes
//!                                         │
//!   every frame:   copy static layer ─────┘
//!                  advance dash phase
//!                  draw dashed interior lines, clipped to the grid bounds
//! ```
//!
//! The static layer is the source image scaled to device pixels plus a
//! rounded border around the grid. Building it costs one pass over the
//! image; a frame costs one copy plus the dashes.
//!
//! The surface's device pixel ratio comes from outside, either pushed with
//! [`PreviewRenderer::surface_changed`] or through a subscribed
//! `watch` channel. A change rebuilds the static layer on the next frame.

use std::fmt;

use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::geometry::GridSpec;
use crate::source::SourceImage;

use super::draw::{dashed_horizontal, dashed_vertical, stroke_rounded_rect};
use super::overlay::{MarchingAnts, OverlayGeometry};

// =============================================================================
// Theme
// =============================================================================

/// Overlay colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Colour of every overlay stroke.
    pub fn stroke_color(self) -> Rgba<u8> {
        match self {
            Theme::Light => Rgba([0, 0, 0, 255]),
            Theme::Dark => Rgba([255, 255, 255, 255]),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

// =============================================================================
// Surface Metrics
// =============================================================================

/// Properties of the surface the preview is drawn on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMetrics {
    device_pixel_ratio: f32,
}

impl SurfaceMetrics {
    /// Metrics for a surface with the given ratio. Non-finite or
    /// non-positive ratios fall back to 1.
    pub fn new(device_pixel_ratio: f32) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self { device_pixel_ratio }
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    /// Backing size in device pixels of a logical `width` x `height`.
    pub fn surface_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.device_pixel_ratio).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// Convert a point on the surface back to logical pixels.
    pub fn to_logical(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.device_pixel_ratio, y / self.device_pixel_ratio)
    }
}

impl Default for SurfaceMetrics {
    fn default() -> Self {
        Self::new(1.0)
    }
}

// =============================================================================
// Renderer
// =============================================================================

struct StaticLayer {
    image: SourceImage,
    grid: GridSpec,
    theme: Theme,
    metrics: SurfaceMetrics,
    pixels: RgbaImage,
    overlay: Option<OverlayGeometry>,
}

impl StaticLayer {
    fn matches(
        &self,
        image: &SourceImage,
        grid: &GridSpec,
        theme: Theme,
        metrics: SurfaceMetrics,
    ) -> bool {
        self.image.same_as(image)
            && self.grid == *grid
            && self.theme == theme
            && self.metrics == metrics
    }
}

/// Draws the image with its grid overlay, one frame at a time.
pub struct PreviewRenderer {
    metrics: SurfaceMetrics,
    surface: Option<watch::Receiver<SurfaceMetrics>>,
    ants: MarchingAnts,
    layer: Option<StaticLayer>,
    frame: RgbaImage,
    static_builds: u64,
}

impl PreviewRenderer {
    pub fn new(metrics: SurfaceMetrics) -> Self {
        Self {
            metrics,
            surface: None,
            ants: MarchingAnts::new(),
            layer: None,
            frame: RgbaImage::new(0, 0),
            static_builds: 0,
        }
    }

    pub fn metrics(&self) -> SurfaceMetrics {
        self.metrics
    }

    /// Follow surface changes published on `surface`.
    pub fn subscribe_surface(&mut self, mut surface: watch::Receiver<SurfaceMetrics>) {
        let metrics = *surface.borrow_and_update();
        self.surface = Some(surface);
        self.surface_changed(metrics);
    }

    /// The surface changed; rebuild the static layer if it matters.
    pub fn surface_changed(&mut self, metrics: SurfaceMetrics) {
        if metrics != self.metrics {
            debug!(
                device_pixel_ratio = metrics.device_pixel_ratio(),
                "Render surface changed"
            );
            self.metrics = metrics;
            self.invalidate();
        }
    }

    /// Drop the cached static layer.
    pub fn invalidate(&mut self) {
        self.layer = None;
    }

    /// How many times the static layer has been built.
    pub fn static_builds(&self) -> u64 {
        self.static_builds
    }

    /// Current dash phase in device pixels.
    pub fn dash_phase(&self) -> f32 {
        self.ants.phase()
    }

    /// Render the next animation frame.
    pub fn render_frame(
        &mut self,
        image: &SourceImage,
        grid: &GridSpec,
        theme: Theme,
    ) -> &RgbaImage {
        self.poll_surface();

        let metrics = self.metrics;
        let stale = !self
            .layer
            .as_ref()
            .is_some_and(|layer| layer.matches(image, grid, theme, metrics));
        if stale {
            self.layer = Some(self.build_static(image, grid, theme));
        }

        let dpr = metrics.device_pixel_ratio();
        self.ants.advance(dpr);

        let Some(layer) = &self.layer else {
            return &self.frame;
        };
        self.frame.clone_from(&layer.pixels);

        if let Some(overlay) = &layer.overlay {
            let pattern = self.ants.pattern(dpr);
            let color = theme.stroke_color();
            let bounds = overlay.bounds;

            for &x in &overlay.vertical {
                dashed_vertical(
                    &mut self.frame,
                    x,
                    bounds.y,
                    bounds.bottom(),
                    overlay.stroke_width,
                    &pattern,
                    color,
                );
            }
            for &y in &overlay.horizontal {
                dashed_horizontal(
                    &mut self.frame,
                    y,
                    bounds.x,
                    bounds.right(),
                    overlay.stroke_width,
                    &pattern,
                    color,
                );
            }
        }

        &self.frame
    }

    fn poll_surface(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        // The last published value stays readable after the sender is gone
        let metrics = *surface.borrow_and_update();
        self.surface_changed(metrics);
    }

    fn build_static(&mut self, image: &SourceImage, grid: &GridSpec, theme: Theme) -> StaticLayer {
        let dpr = self.metrics.device_pixel_ratio();
        let (width, height) = self.metrics.surface_size(image.width(), image.height());

        let mut pixels = if (width, height) == (image.width(), image.height()) {
            image.pixels().clone()
        } else {
            imageops::resize(image.pixels(), width, height, FilterType::Triangle)
        };

        let overlay = OverlayGeometry::compute(grid, dpr);
        if let Some(overlay) = &overlay {
            stroke_rounded_rect(
                &mut pixels,
                overlay.bounds,
                overlay.radius,
                overlay.stroke_width,
                theme.stroke_color(),
            );
        }

        self.static_builds += 1;
        debug!(
            width,
            height,
            void = overlay.is_none(),
            builds = self.static_builds,
            "Static layer rebuilt"
        );

        StaticLayer {
            image: image.clone(),
            grid: *grid,
            theme,
            metrics: self.metrics,
            pixels,
            overlay,
        }
    }
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new(SurfaceMetrics::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
