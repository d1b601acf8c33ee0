//! Archive export integration tests.
//!
//! Tests verify:
//! - An archive of K slices has exactly K entries, slice_1.png ... slice_K.png
//! - Each entry decodes back to the crop of its cell
//! - Export reflects the newest job and leaves the slices alive
//! - Export waits for the running job instead of renumbering partial results

use sprite_slicer::geometry::GridLayout;
use sprite_slicer::slice::{crop_cell, Slicer, SlicerUpdate};
use sprite_slicer::{build_archive, slice_file_name, ExportError};

use super::test_utils::{cell_color, decode_png, fast_options, is_filled_with, read_archive, source};

#[tokio::test]
async fn test_export_round_trip() {
    let image = source(2, 4);
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(image.clone());
    slicer.set_layout(GridLayout {
        rows: 2,
        columns: 4,
        ..GridLayout::default()
    });
    slicer.settle().await;

    let archive = slicer.export().await.unwrap();
    let entries = read_archive(&archive);
    assert_eq!(entries.len(), 8);

    let grid = slicer.grid();
    for (position, cell) in grid.cells().enumerate() {
        let (name, data) = &entries[position];
        assert_eq!(name, &format!("slice_{}.png", position + 1));
        assert_eq!(name, &slice_file_name(position));

        let decoded = decode_png(data);
        assert_eq!(decoded, crop_cell(image.pixels(), cell.rect));
        assert!(is_filled_with(&decoded, cell_color(cell.row, cell.column)));
    }
}

#[tokio::test]
async fn test_export_follows_latest_grid() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(4, 4));
    slicer.settle().await;
    assert_eq!(read_archive(&slicer.export().await.unwrap()).len(), 16);

    slicer.set_rows(1);
    slicer.set_columns(2);
    slicer.settle().await;

    let entries = read_archive(&slicer.export().await.unwrap());
    let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["slice_1.png", "slice_2.png"]);
}

#[tokio::test]
async fn test_export_keeps_slices() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(2, 2));
    slicer.settle().await;

    slicer.export().await.unwrap();
    slicer.export().await.unwrap();
    assert!((0..slicer.slices().len()).all(|i| slicer.slice_bytes(i).is_some()));
}

#[tokio::test]
async fn test_export_of_void_grid_is_empty() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(2, 2));
    slicer.set_columns(0);
    slicer.settle().await;

    let archive = slicer.export().await.unwrap();
    assert!(read_archive(&archive).is_empty());
}

#[tokio::test]
async fn test_export_of_released_slices_fails() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(1, 1));
    slicer.settle().await;

    let handles: Vec<_> = slicer.slices().iter().flatten().copied().collect();
    let store = slicer.store().clone();
    slicer.shutdown();

    let err = build_archive(&store, &handles).unwrap_err();
    assert!(matches!(err, ExportError::MissingSlice { position: 0, .. }));
}

#[tokio::test]
async fn test_export_while_slicing_is_refused() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(4, 4));

    let SlicerUpdate::JobStarted { job_id, .. } = slicer.next_update().await else {
        panic!("Expected a job to start first");
    };
    let err = slicer.export().await.unwrap_err();
    assert!(matches!(err, ExportError::InProgress { job_id: id } if id == job_id));

    slicer.settle().await;
    let entries = read_archive(&slicer.export().await.unwrap());
    assert_eq!(entries.len(), 16);
    assert_eq!(entries[15].0, "slice_16.png");
}
