//! Slicing pipeline integration tests.
//!
//! Tests verify:
//! - Published slices map to their cells in row-major order
//! - Margins, offsets and out-of-bounds crops
//! - Only the newest job reaches the published list
//! - Debounced edits start exactly one job
//! - Void grids and image removal empty the list

use std::time::Duration;

use image::Rgba;
use tokio::time::Instant;

use sprite_slicer::geometry::{CellSize, GridLayout, GridSpec};
use sprite_slicer::slice::{
    Assembly, BlobStore, JobEvent, JobRunner, SliceAssembler, Slicer, SlicerOptions, SlicerUpdate,
};
use sprite_slicer::{OffsetDrag, SourceImage};

use super::test_utils::{
    cell_color, decode_png, encode_png, fast_options, is_filled_with, source, sprite_sheet,
    sprite_sheet_with_margin, CELL,
};

fn grid(rows: i32, columns: i32, cell: i32) -> GridSpec {
    GridSpec {
        rows,
        columns,
        margin_x: 0,
        margin_y: 0,
        offset_x: 0,
        offset_y: 0,
        cell_width: cell,
        cell_height: cell,
    }
}

fn slice_image(slicer: &Slicer, index: usize) -> image::RgbaImage {
    decode_png(&slicer.slice_bytes(index).unwrap())
}

// =============================================================================
// Crop Mapping
// =============================================================================

#[tokio::test]
async fn test_row_major_mapping() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(2, 3));
    slicer.set_layout(GridLayout {
        rows: 2,
        columns: 3,
        ..GridLayout::default()
    });
    slicer.settle().await;

    assert_eq!(slicer.slices().len(), 6);
    for row in 0..2 {
        for column in 0..3 {
            let index = slicer.grid().flat_index(row, column);
            let slice = slice_image(&slicer, index);
            assert_eq!(slice.dimensions(), (CELL, CELL));
            assert!(
                is_filled_with(&slice, cell_color(row, column)),
                "slice {index} is not cell ({row}, {column})"
            );
        }
    }

    // (row 1, column 2) is flat index 5
    assert!(is_filled_with(&slice_image(&slicer, 5), cell_color(1, 2)));
}

#[tokio::test]
async fn test_encoded_sheet_slices_like_raster() {
    let image = SourceImage::decode(&encode_png(&sprite_sheet(2, 2))).unwrap();
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(image);
    slicer.set_layout(GridLayout {
        rows: 2,
        columns: 2,
        ..GridLayout::default()
    });
    slicer.settle().await;

    assert_eq!(slicer.slices().len(), 4);
    assert!(is_filled_with(&slice_image(&slicer, 3), cell_color(1, 1)));
}

#[tokio::test]
async fn test_margins_are_skipped() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(SourceImage::from_rgba(sprite_sheet_with_margin(2, 2, 3)));
    slicer.set_layout(GridLayout {
        rows: 2,
        columns: 2,
        margin_x: 3,
        margin_y: 3,
        ..GridLayout::default()
    });
    slicer.settle().await;

    assert_eq!(slicer.grid().cell_width, CELL as i32);
    assert!(is_filled_with(&slice_image(&slicer, 0), cell_color(0, 0)));
    assert!(is_filled_with(&slice_image(&slicer, 3), cell_color(1, 1)));
}

#[tokio::test]
async fn test_offset_shifts_crops() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(1, 4));
    slicer.set_layout(GridLayout {
        rows: 1,
        columns: 2,
        offset_x: CELL as i32,
        cell_override: Some(CellSize {
            width: CELL as i32,
            height: CELL as i32,
        }),
        ..GridLayout::default()
    });
    slicer.settle().await;

    assert!(is_filled_with(&slice_image(&slicer, 0), cell_color(0, 1)));
    assert!(is_filled_with(&slice_image(&slicer, 1), cell_color(0, 2)));
}

#[tokio::test]
async fn test_out_of_bounds_crop_is_transparent() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(1, 2));
    slicer.set_layout(GridLayout {
        rows: 1,
        columns: 2,
        offset_x: (CELL / 2) as i32,
        ..GridLayout::default()
    });
    slicer.settle().await;

    // The last cell hangs half past the right edge
    let last = slice_image(&slicer, 1);
    assert_eq!(last.dimensions(), (CELL, CELL));
    assert_eq!(*last.get_pixel(0, 0), cell_color(0, 1));
    assert_eq!(*last.get_pixel(CELL - 1, 0), Rgba([0, 0, 0, 0]));
}

#[tokio::test]
async fn test_drag_moves_crops() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(1, 4));
    slicer.set_layout(GridLayout {
        rows: 1,
        columns: 1,
        cell_override: Some(CellSize {
            width: CELL as i32,
            height: CELL as i32,
        }),
        ..GridLayout::default()
    });
    slicer.settle().await;
    assert!(is_filled_with(&slice_image(&slicer, 0), cell_color(0, 0)));

    let layout = slicer.layout();
    let drag = OffsetDrag::begin((2.0, 2.0), (layout.offset_x, layout.offset_y));
    for step in 1..=4 {
        let (x, y) = drag.update((2.0 + step as f32 * 4.1, 2.2));
        slicer.set_offset(x, y);
    }
    slicer.settle().await;

    assert_eq!((slicer.layout().offset_x, slicer.layout().offset_y), (16, 0));
    assert!(is_filled_with(&slice_image(&slicer, 0), cell_color(0, 2)));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_superseded_job_never_published() {
    let store = BlobStore::new();
    let mut runner = JobRunner::new(store.clone());
    let mut assembler = SliceAssembler::new(store.clone());
    let image = source(8, 8);

    let first = runner.start_job(image.clone(), grid(8, 8, CELL as i32));
    assembler.begin_job(first);
    let second = runner.start_job(image, grid(2, 2, (CELL * 2) as i32));
    assembler.begin_job(second);

    loop {
        let event = runner.next_event().await;
        let job_id = event.job_id();
        if assembler.handle_event(event) == Assembly::Completed {
            assert_eq!(job_id, Some(second));
            break;
        }
    }

    let handles = assembler.completed().unwrap().to_vec();
    assert_eq!(handles.len(), 4);
    for (index, handle) in handles.iter().enumerate() {
        let slice = decode_png(&store.get(*handle).unwrap());
        assert_eq!(slice.dimensions(), (CELL * 2, CELL * 2));
        let (row, column) = (index as u32 / 2 * 2, index as u32 % 2 * 2);
        assert_eq!(*slice.get_pixel(0, 0), cell_color(row, column));
    }

    // Everything job 1 produced has been released
    assert_eq!(store.len(), 4);
}

#[tokio::test]
async fn test_results_of_superseded_job_are_withheld() {
    let store = BlobStore::new();
    let mut runner = JobRunner::new(store.clone());
    let mut assembler = SliceAssembler::new(store.clone());

    let first = runner.start_job(source(2, 2), grid(2, 2, CELL as i32));
    assembler.begin_job(first);

    // Let the first job finish without consuming its events
    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = runner.start_job(source(2, 2), grid(1, 1, CELL as i32));
    assembler.begin_job(second);

    loop {
        let event = runner.next_event().await;
        assert_eq!(event.job_id(), Some(second));
        let done = matches!(event, JobEvent::Done { .. });
        let outcome = assembler.handle_event(event);
        if done {
            assert_eq!(outcome, Assembly::Completed);
            break;
        }
    }

    assert_eq!(assembler.slices().len(), 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_rapid_edits_publish_only_last_grid() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(4, 4));

    slicer.set_columns(1);
    slicer.set_rows(1);
    let SlicerUpdate::JobStarted { job_id: first, .. } = slicer.next_update().await else {
        panic!("Expected a job to start first");
    };

    // A burst of edits right behind the first job
    for columns in 2..=4 {
        slicer.set_columns(columns);
        slicer.set_rows(columns);
    }
    let completed = slicer.settle().await;

    let grid = slicer.grid();
    assert_eq!(completed, slicer.current_job());
    assert!(completed > Some(first));
    assert_eq!((grid.rows, grid.columns), (4, 4));
    assert_eq!(slicer.slices().len(), 16);
    assert_eq!(slicer.store().len(), 16);
    assert!(is_filled_with(&slice_image(&slicer, 15), cell_color(3, 3)));
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_triggers_one_job_after_short_delay() {
    let mut slicer = Slicer::new(SlicerOptions::default());
    slicer.set_image(source(4, 4));

    for rows in 1..=4 {
        tokio::time::advance(Duration::from_millis(40)).await;
        slicer.set_rows(rows);
    }
    let last_change = Instant::now();

    let SlicerUpdate::JobStarted { grid, .. } = slicer.next_update().await else {
        panic!("Expected a job to start first");
    };
    assert_eq!(grid.rows, 4);
    assert_eq!(last_change.elapsed(), Duration::from_millis(50));

    let mut started = 1;
    loop {
        match slicer.next_update().await {
            SlicerUpdate::JobStarted { .. } => started += 1,
            SlicerUpdate::Completed { count, .. } => {
                assert_eq!(count, 16);
                break;
            }
            _ => {}
        }
    }
    assert_eq!(started, 1);
}

#[tokio::test(start_paused = true)]
async fn test_isolated_edit_uses_long_delay() {
    let mut slicer = Slicer::new(SlicerOptions::default());
    let loaded = Instant::now();
    slicer.set_image(source(2, 2));

    let SlicerUpdate::JobStarted { .. } = slicer.next_update().await else {
        panic!("Expected a job to start first");
    };
    assert_eq!(loaded.elapsed(), Duration::from_millis(300));
}

// =============================================================================
// Void Grid and Image Removal
// =============================================================================

#[tokio::test]
async fn test_zero_rows_yields_empty_list() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(2, 2));
    slicer.settle().await;
    assert_eq!(slicer.slices().len(), 16);

    slicer.set_rows(0);
    slicer.settle().await;
    assert!(slicer.slices().is_empty());
    assert!(slicer.store().is_empty());
}

#[tokio::test]
async fn test_margins_swallowing_image_yield_empty_list() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(1, 1));
    slicer.set_margin(CELL as i32, 0);
    slicer.settle().await;

    assert!(slicer.grid().is_void());
    assert!(slicer.slices().is_empty());
    assert!(slicer.is_complete());
}

#[tokio::test]
async fn test_clear_image_cancels_and_empties() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(8, 8));
    slicer.settle().await;
    assert!(!slicer.slices().is_empty());

    slicer.set_columns(2);
    slicer.clear_image();
    assert!(slicer.slices().is_empty());
    assert_eq!(slicer.settle().await, None);

    // Let a cancelled job finish releasing its work
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(slicer.store().is_empty());
}

#[tokio::test]
async fn test_image_reload_reslices() {
    let mut slicer = Slicer::new(fast_options());
    slicer.set_image(source(4, 4));
    slicer.settle().await;

    slicer.set_image(SourceImage::from_rgba(sprite_sheet(4, 4)));
    let completed = slicer.settle().await;
    assert_eq!(completed, slicer.current_job());
    assert_eq!(slicer.slices().len(), 16);
}
