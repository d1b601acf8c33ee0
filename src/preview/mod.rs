//! Live preview of the grid over the source image.
//!
//! # Components
//!
//! - [`PreviewRenderer`]: Static layer cache plus the animated dashed grid
//! - [`OverlayGeometry`]: Grid bounds and interior lines in device pixels
//! - [`MarchingAnts`]: Per-frame dash phase
//! - [`SurfaceMetrics`]: Device pixel ratio of the render surface
//! - [`OffsetDrag`]: Pointer drag to grid offset
//!
//! # Example
//!
//! ```
//! use image::{Rgba, RgbaImage};
//! use sprite_slicer::geometry::GridLayout;
//! use sprite_slicer::preview::{PreviewRenderer, SurfaceMetrics, Theme};
//! use sprite_slicer::SourceImage;
//!
//! let image = SourceImage::from_rgba(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 0])));
//! let grid = GridLayout::default().resolve(image.width(), image.height());
//!
//! let mut renderer = PreviewRenderer::new(SurfaceMetrics::new(2.0));
//! let frame = renderer.render_frame(&image, &grid, Theme::Dark);
//! assert_eq!(frame.dimensions(), (128, 128));
//! ```

mod drag;
mod draw;
mod overlay;
mod renderer;

pub use drag::OffsetDrag;
pub use overlay::{
    DashPattern, DeviceRect, MarchingAnts, OverlayGeometry, BORDER_RADIUS, DASH_GAP, DASH_LENGTH,
    DASH_STEP, STROKE_WIDTH,
};
pub use renderer::{PreviewRenderer, SurfaceMetrics, Theme};
