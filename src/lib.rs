//! # Sprite Slicer
//!
//! Carves a sprite-sheet image into a uniform grid of cells and exports
//! them, keeping the result live while the grid is being edited.
//!
//! ## Features
//!
//! - **Adaptive debounce**: bursts of grid edits collapse into one re-slice
//! - **Cancellable jobs**: every job is id-tagged; superseded work never reaches the published list
//! - **Off-thread cropping**: cells are cropped and PNG encoded on a worker thread and a rayon pool
//! - **Live preview**: cached static layer plus an animated dashed grid, crisp at any pixel ratio
//! - **Zip export**: `slice_1.png` ... `slice_n.png` in row-major order
//!
//! ## Architecture
//!
//! - [`geometry`] - Cell size calculation and grid resolution
//! - [`source`] - Shared, read-only source image
//! - [`slice`] - Scheduler, job runner, worker and assembler
//! - [`preview`] - Overlay renderer
//! - [`export`] - Zip archive assembly
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use sprite_slicer::{Slicer, SourceImage};
//!
//! #[tokio::main]
//! async fn main() {
//!     let image = SourceImage::open("sheet.png").unwrap();
//!
//!     let mut slicer = Slicer::default();
//!     slicer.set_image(image);
//!     slicer.set_columns(8);
//!     slicer.settle().await;
//!
//!     let archive = slicer.export().await.unwrap();
//!     std::fs::write("sprites.zip", archive).unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod preview;
pub mod slice;
pub mod source;

// Re-export commonly used types
pub use config::{Cli, Command, GridArgs, GridConfig, PreviewConfig, SliceConfig, TimingArgs};
pub use error::{EncodeError, ExportError, SourceError, WorkerError};
pub use export::{build_archive, export_archive, slice_file_name, ARCHIVE_FILE_NAME};
pub use geometry::{
    calculate_cell_size, Cell, CellRect, CellSize, GridLayout, GridSpec, DEFAULT_CELL_SIZE,
    DEFAULT_COLUMNS, DEFAULT_ROWS,
};
pub use preview::{OffsetDrag, PreviewRenderer, SurfaceMetrics, Theme};
pub use slice::{
    BlobStore, ChangeScheduler, DebounceConfig, JobEvent, JobId, JobRunner, SliceAssembler,
    SliceHandle, Slicer, SlicerOptions, SlicerUpdate,
};
pub use source::SourceImage;
