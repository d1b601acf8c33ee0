//! The slicer: one scheduler, one runner and one assembler driven by a
//! single control loop.
//!
//! # Data Flow
//!
//! ```text
//!   set_* / set_image ──▶ ChangeScheduler ──(debounced GridSpec)──▶ JobRunner::start_job
//!                                                                        │
//!                                        worker ──(JobEvent)─────────────┘
//!                                           │
//!                                           ▼
//!                                    SliceAssembler ──(frame tick)──▶ published slices
//! ```
//!
//! Everything here runs on the caller's task. The only concurrent work is
//! the worker's cropping, which reaches the slicer as job-tagged events.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::error::ExportError;
use crate::export::export_archive;
use crate::geometry::{CellSize, GridLayout, GridSpec};
use crate::source::SourceImage;

use super::assembler::{Assembly, SliceAssembler};
use super::job::{JobEvent, JobId};
use super::runner::JobRunner;
use super::scheduler::{ChangeScheduler, DebounceConfig};
use super::store::{BlobStore, SliceHandle};

/// Interval between display refreshes.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Timing for one slicer instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlicerOptions {
    pub debounce: DebounceConfig,
    pub frame_interval: Duration,
}

impl Default for SlicerOptions {
    fn default() -> Self {
        Self {
            debounce: DebounceConfig::default(),
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Something visible changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlicerUpdate {
    /// A debounced edit started a new job
    JobStarted { job_id: JobId, grid: GridSpec },

    /// Partial results were published on a frame tick
    Published { job_id: JobId, len: usize },

    /// The current job finished
    Completed { job_id: JobId, count: usize },

    /// The worker was lost and the slice list emptied
    Cleared,
}

/// Live sprite-sheet slicer.
pub struct Slicer {
    options: SlicerOptions,
    image: Option<SourceImage>,
    layout: GridLayout,
    scheduler: ChangeScheduler<GridSpec>,
    runner: JobRunner,
    assembler: SliceAssembler,
    next_frame: Option<Instant>,
}

impl Slicer {
    pub fn new(options: SlicerOptions) -> Self {
        let store = BlobStore::new();
        Self {
            options,
            image: None,
            layout: GridLayout::default(),
            scheduler: ChangeScheduler::new(options.debounce),
            runner: JobRunner::new(store.clone()),
            assembler: SliceAssembler::new(store),
            next_frame: None,
        }
    }

    // -------------------------------------------------------------------------
    // Inputs
    // -------------------------------------------------------------------------

    /// Load a new source image.
    pub fn set_image(&mut self, image: SourceImage) {
        debug!(
            width = image.width(),
            height = image.height(),
            "Source image set"
        );
        self.image = Some(image);
        self.notify();
    }

    /// Remove the source image, cancelling any job and emptying the list.
    pub fn clear_image(&mut self) {
        self.image = None;
        self.scheduler.cancel();
        self.runner.cancel_active();
        self.assembler.reset();
        self.next_frame = None;
    }

    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Replace the whole layout.
    pub fn set_layout(&mut self, layout: GridLayout) {
        self.layout = layout;
        self.notify();
    }

    pub fn set_rows(&mut self, rows: i32) {
        self.layout.rows = rows;
        self.notify();
    }

    pub fn set_columns(&mut self, columns: i32) {
        self.layout.columns = columns;
        self.notify();
    }

    pub fn set_margin(&mut self, margin_x: i32, margin_y: i32) {
        self.layout.margin_x = margin_x;
        self.layout.margin_y = margin_y;
        self.notify();
    }

    pub fn set_offset(&mut self, offset_x: i32, offset_y: i32) {
        self.layout.offset_x = offset_x;
        self.layout.offset_y = offset_y;
        self.notify();
    }

    /// Override the derived cell size, or go back to deriving it.
    pub fn set_cell_override(&mut self, cell: Option<CellSize>) {
        self.layout.cell_override = cell;
        self.notify();
    }

    /// The grid for the current image and layout, resolved immediately.
    pub fn grid(&self) -> GridSpec {
        match &self.image {
            Some(image) => self.layout.resolve(image.width(), image.height()),
            None => self.layout.resolve_without_image(),
        }
    }

    fn notify(&mut self) {
        if self.image.is_some() {
            let delay = self.scheduler.notify_change(self.grid());
            debug!(delay_ms = delay.as_millis() as u64, "Re-slice scheduled");
        }
    }

    // -------------------------------------------------------------------------
    // Control loop
    // -------------------------------------------------------------------------

    /// Drive the pipeline until something visible changes.
    pub async fn next_update(&mut self) -> SlicerUpdate {
        loop {
            let next_frame = self.next_frame;

            tokio::select! {
                grid = self.scheduler.fired() => {
                    if let Some(update) = self.start_job(grid) {
                        return update;
                    }
                }
                event = self.runner.next_event() => {
                    if let Some(update) = self.apply(event) {
                        return update;
                    }
                }
                _ = sleep_until(next_frame.unwrap_or_else(Instant::now)), if next_frame.is_some() => {
                    if let Some(update) = self.publish_frame() {
                        return update;
                    }
                }
            }
        }
    }

    /// Run the loop until no edit, job or frame is pending.
    ///
    /// Returns the last job that completed while settling.
    pub async fn settle(&mut self) -> Option<JobId> {
        let mut completed = None;
        loop {
            if !self.scheduler.is_pending()
                && self.runner.active_job().is_none()
                && self.next_frame.is_none()
            {
                while let Some(event) = self.runner.try_next_event() {
                    if let Some(SlicerUpdate::Completed { job_id, .. }) = self.apply(event) {
                        completed = Some(job_id);
                    }
                }
                return completed;
            }

            if let SlicerUpdate::Completed { job_id, .. } = self.next_update().await {
                completed = Some(job_id);
            }
        }
    }

    fn start_job(&mut self, grid: GridSpec) -> Option<SlicerUpdate> {
        let image = self.image.clone()?;
        let job_id = self.runner.start_job(image, grid);
        self.assembler.begin_job(job_id);
        self.next_frame = None;
        Some(SlicerUpdate::JobStarted { job_id, grid })
    }

    fn apply(&mut self, event: JobEvent) -> Option<SlicerUpdate> {
        let job_id = event.job_id();
        match self.assembler.handle_event(event) {
            Assembly::Stale | Assembly::Recorded => None,
            Assembly::SchedulePublish => {
                self.next_frame = Some(Instant::now() + self.options.frame_interval);
                None
            }
            Assembly::Completed => {
                self.next_frame = None;
                let count = self.assembler.slices().len();
                job_id.map(|job_id| SlicerUpdate::Completed { job_id, count })
            }
            Assembly::Failed => {
                self.next_frame = None;
                Some(SlicerUpdate::Cleared)
            }
        }
    }

    fn publish_frame(&mut self) -> Option<SlicerUpdate> {
        self.next_frame = None;
        let job_id = self.assembler.current_job()?;
        let len = self.assembler.publish().len();
        Some(SlicerUpdate::Published { job_id, len })
    }

    // -------------------------------------------------------------------------
    // Outputs
    // -------------------------------------------------------------------------

    /// The published slice list; `None` marks a cell still in flight.
    pub fn slices(&self) -> &[Option<SliceHandle>] {
        self.assembler.slices()
    }

    /// Whether the current job has delivered every slice.
    pub fn is_complete(&self) -> bool {
        self.assembler.completed().is_some()
    }

    /// Encoded PNG of a published slice.
    pub fn slice_bytes(&self, index: usize) -> Option<Bytes> {
        let handle = (*self.slices().get(index)?)?;
        self.assembler.store().get(handle)
    }

    /// The job whose results are published.
    pub fn current_job(&self) -> Option<JobId> {
        self.assembler.current_job()
    }

    pub fn store(&self) -> &BlobStore {
        self.assembler.store()
    }

    /// Build a zip archive of the current slices.
    ///
    /// Fails with [`ExportError::InProgress`] until the current job is done.
    pub async fn export(&self) -> Result<Bytes, ExportError> {
        let handles = self.assembler.export_handles()?;
        export_archive(self.store().clone(), handles).await
    }

    /// Stop everything and release every slice.
    pub fn shutdown(&mut self) {
        self.scheduler.cancel();
        self.runner.terminate();
        self.assembler.reset();
        self.next_frame = None;
    }
}

impl Default for Slicer {
    fn default() -> Self {
        Self::new(SlicerOptions::default())
    }
}

// =============================================================================
// Tests
// =============================================================================
