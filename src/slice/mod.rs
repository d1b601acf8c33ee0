//! Slicing pipeline.
//!
//! This module turns a source image and a grid into an ordered list of
//! encoded cells, kept live while the grid is being edited.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                 Slicer                  │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │   Change     │  │     Slice       │  │
//! │  │  Scheduler   │  │   Assembler     │  │
//! │  └──────┬───────┘  └────────▲────────┘  │
//! │         │   ┌───────────┐   │           │
//! │         └──▶│ JobRunner │───┘           │
//! │             └─────┬─────┘  JobEvent     │
//! └───────────────────┼─────────────────────┘
//!                     │ WorkerMessage
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │   slice worker thread ── rayon pool     │
//! │   crop_cell → PngSliceEncoder → store   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Slicer`]: Per-instance facade owning one scheduler, runner and assembler
//! - [`ChangeScheduler`]: Adaptive debounce of grid edits
//! - [`JobRunner`]: Job id allocation, cancellation and the worker event stream
//! - [`SliceAssembler`]: Job-filtered slot filling with once-per-frame publication
//! - [`BlobStore`]: Revocable storage for encoded slices
//! - [`CellEncoder`], [`PngSliceEncoder`]: Crops and encodes one cell
//!
//! # Example
//!
//! ```no_run
//! use sprite_slicer::{SourceImage, Slicer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let image = SourceImage::open("sheet.png").unwrap();
//!
//!     let mut slicer = Slicer::default();
//!     slicer.set_image(image);
//!     slicer.set_rows(2);
//!
//!     slicer.settle().await;
//!     println!("{} slices", slicer.slices().len());
//! }
//! ```

mod assembler;
mod encoder;
mod job;
mod pipeline;
mod runner;
mod scheduler;
mod store;
mod worker;

pub use assembler::{Assembly, SliceAssembler};
pub use encoder::{crop_cell, CellEncoder, PngSliceEncoder};
pub use job::{CancelToken, JobEvent, JobId, WorkerMessage};
pub use pipeline::{Slicer, SlicerOptions, SlicerUpdate, DEFAULT_FRAME_INTERVAL};
pub use runner::JobRunner;
pub use scheduler::{
    ChangeScheduler, DebounceConfig, DEFAULT_IDLE_THRESHOLD, DEFAULT_LONG_DELAY,
    DEFAULT_SHORT_DELAY,
};
pub use store::{BlobStore, SliceHandle};
pub use worker::WorkerHandle;
