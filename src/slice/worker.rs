//! Slice worker.
//!
//! The worker is a dedicated thread that owns no state shared with the
//! control thread except the blob store and the per-job cancel token. It
//! receives [`WorkerMessage`]s, crops every cell of a job on the rayon pool
//! and reports [`JobEvent`]s tagged with the job id.
//!
//! A job that gets cancelled stops picking up new cells, releases every
//! handle it produced and emits nothing further. A job with a cell that
//! cannot be produced at all is abandoned the same way and reported as
//! [`JobEvent::Failed`], so `Done` always carries one handle per cell. If the
//! worker panics while a job is running it reports [`JobEvent::WorkerLost`]
//! on its way down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use rayon::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::WorkerError;
use crate::geometry::{Cell, GridSpec};
use crate::source::SourceImage;

use super::encoder::{CellEncoder, PngSliceEncoder};
use super::job::{CancelToken, JobEvent, JobId, WorkerMessage};
use super::store::{BlobStore, SliceHandle};

const WORKER_THREAD_NAME: &str = "slice-worker";

// =============================================================================
// Worker Handle
// =============================================================================

/// Control-side handle to a running worker thread.
pub struct WorkerHandle {
    tx: mpsc::UnboundedSender<WorkerMessage>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    /// Start a worker that stores slices in `store` and reports on `events`.
    pub fn spawn(
        store: BlobStore,
        events: mpsc::UnboundedSender<JobEvent>,
    ) -> Result<Self, WorkerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let thread = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(rx, store, events))?;

        debug!("Slice worker started");
        Ok(Self { tx, thread })
    }

    /// Queue a message, handing it back if the worker is gone.
    pub fn send(&self, message: WorkerMessage) -> Result<(), WorkerMessage> {
        self.tx.send(message).map_err(|e| e.0)
    }

    /// Whether the worker thread is still accepting messages.
    pub fn is_alive(&self) -> bool {
        !self.tx.is_closed() && !self.thread.is_finished()
    }

    /// Ask the worker to exit once its current job returns.
    pub fn terminate(&self) {
        if self.tx.send(WorkerMessage::Terminate).is_err() {
            debug!("Slice worker already stopped");
        }
    }
}

// =============================================================================
// Worker Loop
// =============================================================================

/// Reports a lost worker if the thread unwinds mid-job.
struct LostGuard<'a> {
    events: &'a mpsc::UnboundedSender<JobEvent>,
    job_id: JobId,
}

impl Drop for LostGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            warn!(job_id = %self.job_id, "Slice worker panicked");
            let _ = self.events.send(JobEvent::WorkerLost {
                job_id: Some(self.job_id),
            });
        }
    }
}

fn run_worker(
    mut rx: mpsc::UnboundedReceiver<WorkerMessage>,
    store: BlobStore,
    events: mpsc::UnboundedSender<JobEvent>,
) {
    let encoder = PngSliceEncoder::new();

    while let Some(message) = rx.blocking_recv() {
        match message {
            WorkerMessage::Terminate => {
                debug!("Slice worker terminating");
                break;
            }
            WorkerMessage::Slice {
                job_id,
                image,
                grid,
                cancel,
            } => {
                let _guard = LostGuard {
                    events: &events,
                    job_id,
                };
                slice_job(job_id, &image, &grid, &cancel, &store, &events, &encoder);
            }
        }
    }
}

/// Crop every cell of `grid` and report it.
pub(crate) fn slice_job<E: CellEncoder>(
    job_id: JobId,
    image: &SourceImage,
    grid: &GridSpec,
    cancel: &CancelToken,
    store: &BlobStore,
    events: &mpsc::UnboundedSender<JobEvent>,
    encoder: &E,
) {
    if cancel.is_cancelled() {
        debug!(job_id = %job_id, "Job cancelled before start");
        return;
    }

    if grid.is_void() {
        debug!(job_id = %job_id, "Void grid, nothing to slice");
        let _ = events.send(JobEvent::Done {
            job_id,
            handles: Vec::new(),
        });
        return;
    }

    let failed = AtomicBool::new(false);
    let cells: Vec<Cell> = grid.cells().collect();
    let produced: Vec<SliceHandle> = cells
        .par_iter()
        .filter_map(|cell| {
            if cancel.is_cancelled() || failed.load(Ordering::Relaxed) {
                return None;
            }

            let data = match encoder.encode_cell(image.pixels(), cell.rect) {
                Ok(data) => data,
                Err(e) => {
                    warn!(job_id = %job_id, index = cell.index, error = %e, "Cell lost");
                    failed.store(true, Ordering::Relaxed);
                    return None;
                }
            };

            let handle = store.insert(data);
            if cancel.is_cancelled() {
                store.revoke(handle);
                return None;
            }

            let _ = events.send(JobEvent::SliceReady {
                job_id,
                index: cell.index,
                handle,
            });
            Some(handle)
        })
        .collect();

    if cancel.is_cancelled() {
        let released = store.revoke_all(&produced);
        debug!(job_id = %job_id, released, "Job cancelled mid-flight");
        return;
    }

    if failed.load(Ordering::Relaxed) {
        let released = store.revoke_all(&produced);
        warn!(job_id = %job_id, released, "Job abandoned");
        let _ = events.send(JobEvent::Failed { job_id });
        return;
    }

    debug!(job_id = %job_id, cells = produced.len(), "Job sliced");
    let _ = events.send(JobEvent::Done {
        job_id,
        handles: produced,
    });
}

// =============================================================================
// Tests
// =============================================================================
