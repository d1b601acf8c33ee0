//! Preview renderer integration tests.
//!
//! Tests verify:
//! - The preview follows the slicer's grid without waiting for slicing
//! - Device pixel ratio changes published from another task
//! - Pointer drags on a high-density surface move the grid in image pixels

use image::Rgba;
use tokio::sync::watch;

use sprite_slicer::preview::{OffsetDrag, PreviewRenderer, SurfaceMetrics, Theme};
use sprite_slicer::slice::Slicer;

use super::test_utils::{cell_color, fast_options, source, CELL};

#[tokio::test]
async fn test_preview_tracks_grid_before_slicing() {
    let mut slicer = Slicer::new(fast_options());
    let image = source(4, 4);
    slicer.set_image(image.clone());
    slicer.set_rows(2);

    // Nothing has been sliced yet
    assert!(slicer.slices().is_empty());

    let mut renderer = PreviewRenderer::default();
    let frame = renderer.render_frame(&image, &slicer.grid(), Theme::Dark);
    assert_eq!(frame.dimensions(), image.pixels().dimensions());

    // Border along the top edge, midway between the corners
    assert_eq!(*frame.get_pixel(2 * CELL, 0), Rgba([255, 255, 255, 255]));
    // Cell interiors untouched
    assert_eq!(*frame.get_pixel(CELL / 2, CELL / 2), cell_color(0, 0));
}

#[tokio::test]
async fn test_void_grid_preview_is_bare_image() {
    let image = source(2, 2);
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(image.clone());
    slicer.set_columns(0);

    let mut renderer = PreviewRenderer::default();
    let frame = renderer.render_frame(&image, &slicer.grid(), Theme::Light);
    assert_eq!(frame, image.pixels());
}

#[tokio::test]
async fn test_surface_change_from_another_task() {
    let (tx, rx) = watch::channel(SurfaceMetrics::new(1.0));
    let mut renderer = PreviewRenderer::default();
    renderer.subscribe_surface(rx);

    let image = source(2, 2);
    let grid = sprite_slicer::GridLayout::default().resolve(image.width(), image.height());
    assert_eq!(
        renderer.render_frame(&image, &grid, Theme::Light).dimensions(),
        (2 * CELL, 2 * CELL)
    );

    tokio::spawn(async move {
        tx.send(SurfaceMetrics::new(2.0)).unwrap();
    })
    .await
    .unwrap();

    let frame = renderer.render_frame(&image, &grid, Theme::Light);
    assert_eq!(frame.dimensions(), (4 * CELL, 4 * CELL));
    assert_eq!(renderer.static_builds(), 2);
}

#[tokio::test]
async fn test_drag_on_dense_surface() {
    let metrics = SurfaceMetrics::new(2.0);
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(2, 2));

    // The pointer moves 10 device pixels right and 6 down
    let start = metrics.to_logical(40.0, 40.0);
    let drag = OffsetDrag::begin(start, (0, 0));
    let (x, y) = drag.update(metrics.to_logical(50.0, 46.0));
    slicer.set_offset(x, y);

    assert_eq!((slicer.layout().offset_x, slicer.layout().offset_y), (5, 3));
    slicer.settle().await;
    assert_eq!(slicer.grid().offset_x, 5);
}
