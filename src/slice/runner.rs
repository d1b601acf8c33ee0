//! Slicing job runner.
//!
//! The runner allocates job ids, dispatches jobs to the worker and exposes
//! the worker's event stream to the control thread.
//!
//! # Job Lifecycle
//!
//! ```text
//!   start_job ──▶ running ──▶ Done / Failed   (terminal event, last for the id)
//!                    │
//!                    └──────▶ superseded      (next start_job or cancel)
//! ```
//!
//! Starting a job cancels the previous one first. Once a job is no longer
//! active the runner withholds every event still queued for it and releases
//! the handles those events carry, so consumers only ever see the running
//! job.
//!
//! The worker is spawned lazily and respawned when it is found dead. A job
//! that cannot be dispatched at all is reported as
//! [`JobEvent::WorkerLost`] so consumers fall back to an empty slice list.

use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::error::WorkerError;
use crate::geometry::GridSpec;
use crate::source::SourceImage;

use super::job::{CancelToken, JobEvent, JobId, WorkerMessage};
use super::store::BlobStore;
use super::worker::WorkerHandle;

struct ActiveJob {
    job_id: JobId,
    cancel: CancelToken,
}

/// Owns the slice worker and the job-id counter of one slicer instance.
pub struct JobRunner {
    store: BlobStore,
    worker: Option<WorkerHandle>,
    last_job: JobId,
    active: Option<ActiveJob>,
    events_tx: mpsc::UnboundedSender<JobEvent>,
    events_rx: mpsc::UnboundedReceiver<JobEvent>,
}

impl JobRunner {
    /// Create a runner storing slices in `store`.
    pub fn new(store: BlobStore) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            store,
            worker: None,
            last_job: JobId::new(0),
            active: None,
            events_tx,
            events_rx,
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Start slicing `image` along `grid`, superseding any running job.
    ///
    /// Returns the new job id, strictly greater than every previous one.
    pub fn start_job(&mut self, image: SourceImage, grid: GridSpec) -> JobId {
        if let Some(previous) = self.active.take() {
            previous.cancel.cancel();
            debug!(job_id = %previous.job_id, "Job superseded");
        }

        let job_id = self.last_job.next();
        self.last_job = job_id;

        let cancel = CancelToken::new();
        let message = WorkerMessage::Slice {
            job_id,
            image,
            grid,
            cancel: cancel.clone(),
        };

        match self.dispatch(message) {
            Ok(()) => {
                debug!(job_id = %job_id, cells = grid.cell_count(), "Job started");
                self.active = Some(ActiveJob { job_id, cancel });
            }
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to start job");
                let _ = self.events_tx.send(JobEvent::WorkerLost {
                    job_id: Some(job_id),
                });
            }
        }

        job_id
    }

    /// Cancel `job_id` if it is still running. Cancelling a finished or
    /// superseded job is a no-op.
    pub fn cancel(&mut self, job_id: JobId) -> bool {
        match self.active.take() {
            Some(active) if active.job_id == job_id => {
                active.cancel.cancel();
                debug!(job_id = %job_id, "Job cancelled");
                true
            }
            other => {
                self.active = other;
                false
            }
        }
    }

    /// Cancel whatever job is running.
    pub fn cancel_active(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            debug!(job_id = %active.job_id, "Job cancelled");
        }
    }

    /// The running job, if any.
    pub fn active_job(&self) -> Option<JobId> {
        self.active.as_ref().map(|a| a.job_id)
    }

    /// The most recently started job, running or not.
    pub fn latest_job(&self) -> Option<JobId> {
        (self.last_job.get() > 0).then_some(self.last_job)
    }

    /// Wait for the next worker event of the running job.
    pub async fn next_event(&mut self) -> JobEvent {
        loop {
            // The runner holds a sender, so the channel never closes
            let event = match self.events_rx.recv().await {
                Some(event) => event,
                None => JobEvent::WorkerLost { job_id: None },
            };
            if let Some(event) = self.admit(event) {
                return event;
            }
        }
    }

    /// Next worker event if one is already queued.
    pub fn try_next_event(&mut self) -> Option<JobEvent> {
        loop {
            let event = self.events_rx.try_recv().ok()?;
            if let Some(event) = self.admit(event) {
                return Some(event);
            }
        }
    }

    /// Track the active job, dropping events of jobs that are no longer
    /// active.
    fn admit(&mut self, event: JobEvent) -> Option<JobEvent> {
        let active = self.active_job();
        match &event {
            JobEvent::SliceReady { job_id, handle, .. } => {
                if active != Some(*job_id) {
                    self.store.revoke(*handle);
                    trace!(job_id = %job_id, "Dropped slice of inactive job");
                    return None;
                }
            }
            JobEvent::Done { job_id, handles } => {
                if active != Some(*job_id) {
                    let released = self.store.revoke_all(handles);
                    debug!(job_id = %job_id, released, "Dropped result of inactive job");
                    return None;
                }
                self.active = None;
            }
            JobEvent::Failed { job_id } => {
                if active != Some(*job_id) {
                    return None;
                }
                self.active = None;
            }
            JobEvent::WorkerLost { job_id } => {
                if job_id.is_none() || active == *job_id {
                    self.active = None;
                }
                self.worker = None;
            }
        }
        Some(event)
    }

    /// Cancel the running job and stop the worker.
    pub fn terminate(&mut self) {
        self.cancel_active();
        if let Some(worker) = self.worker.take() {
            worker.terminate();
        }
    }

    fn dispatch(&mut self, message: WorkerMessage) -> Result<(), WorkerError> {
        let message = match self.live_worker()?.send(message) {
            Ok(()) => return Ok(()),
            Err(message) => message,
        };

        // The worker died between the liveness check and the send
        self.worker = None;
        self.live_worker()?
            .send(message)
            .map_err(|_| WorkerError::Disconnected)
    }

    fn live_worker(&mut self) -> Result<&WorkerHandle, WorkerError> {
        if !self.worker.as_ref().is_some_and(WorkerHandle::is_alive) {
            let worker = WorkerHandle::spawn(self.store.clone(), self.events_tx.clone())?;
            self.worker = Some(worker);
        }
        self.worker.as_ref().ok_or(WorkerError::Disconnected)
    }
}

impl Drop for JobRunner {
    fn drop(&mut self) {
        self.terminate();
    }
}

// =============================================================================
// Tests
// =============================================================================
