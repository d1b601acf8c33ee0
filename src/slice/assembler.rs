//! Slice assembler.
//!
//! Turns the worker's streamed, possibly out-of-order events into a dense,
//! index-ordered slice list, publishing at most once per display refresh.
//!
//! # Publication
//!
//! ```text
//!   SliceReady ──▶ record(index, handle) ──▶ publish pending?
//!                                               │ no ──▶ schedule publish
//!                                               │ yes ─▶ (just recorded)
//!
//!   frame tick ──▶ publish(): [0 ..= max recorded index], gaps are None
//! ```
//!
//! The assembler only ever tracks one job. Events for any other job are
//! dropped and the handles they carry are revoked. Starting a new job,
//! resetting, a failed job or losing the worker releases every handle the
//! previous job left behind.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::ExportError;

use super::job::{JobEvent, JobId};
use super::store::{BlobStore, SliceHandle};

/// What handling one event did to the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// The event belonged to another job and was dropped
    Stale,

    /// The slice was recorded and a publish must be scheduled
    SchedulePublish,

    /// The slice was recorded into an already pending publish
    Recorded,

    /// The job finished and the full list has been published
    Completed,

    /// The job failed or the worker was lost; the published list is now empty
    Failed,
}

/// Index-addressed slot filling for the current job.
#[derive(Debug)]
pub struct SliceAssembler {
    store: BlobStore,
    current: Option<JobId>,
    recorded: BTreeMap<usize, SliceHandle>,
    publish_pending: bool,
    published: Vec<Option<SliceHandle>>,
    completed: Option<Vec<SliceHandle>>,
}

impl SliceAssembler {
    pub fn new(store: BlobStore) -> Self {
        Self {
            store,
            current: None,
            recorded: BTreeMap::new(),
            publish_pending: false,
            published: Vec::new(),
            completed: None,
        }
    }

    /// Make `job_id` the current job, releasing everything from the
    /// previous one.
    pub fn begin_job(&mut self, job_id: JobId) {
        self.release();
        self.current = Some(job_id);
    }

    /// Drop the current job and everything it produced.
    pub fn reset(&mut self) {
        self.release();
        self.current = None;
    }

    /// The job whose events are accepted.
    pub fn current_job(&self) -> Option<JobId> {
        self.current
    }

    /// Apply one worker event.
    pub fn handle_event(&mut self, event: JobEvent) -> Assembly {
        match event {
            JobEvent::SliceReady {
                job_id,
                index,
                handle,
            } => {
                if self.current != Some(job_id) || self.completed.is_some() {
                    self.store.revoke(handle);
                    return Assembly::Stale;
                }
                self.recorded.insert(index, handle);
                if self.publish_pending {
                    Assembly::Recorded
                } else {
                    self.publish_pending = true;
                    Assembly::SchedulePublish
                }
            }
            JobEvent::Done { job_id, handles } => {
                if self.current != Some(job_id) {
                    self.store.revoke_all(&handles);
                    return Assembly::Stale;
                }
                self.publish_pending = false;
                self.published = handles.iter().copied().map(Some).collect();
                self.recorded = handles.iter().copied().enumerate().collect();
                info!(job_id = %job_id, slices = handles.len(), "Slices ready");
                self.completed = Some(handles);
                Assembly::Completed
            }
            JobEvent::Failed { job_id } => {
                if self.current != Some(job_id) {
                    return Assembly::Stale;
                }
                warn!(job_id = %job_id, "Job failed, clearing slices");
                self.reset();
                Assembly::Failed
            }
            JobEvent::WorkerLost { job_id } => {
                if job_id.is_some() && job_id != self.current {
                    return Assembly::Stale;
                }
                warn!(job_id = ?job_id, "Slice worker lost, clearing slices");
                self.reset();
                Assembly::Failed
            }
        }
    }

    /// Whether recorded slices are waiting for the next frame.
    pub fn publish_pending(&self) -> bool {
        self.publish_pending
    }

    /// Materialize the recorded slices as the published list.
    ///
    /// The list runs from index 0 to the highest recorded index; indices
    /// that have not arrived yet are `None`.
    pub fn publish(&mut self) -> &[Option<SliceHandle>] {
        if self.publish_pending {
            self.publish_pending = false;
            let len = self
                .recorded
                .keys()
                .next_back()
                .map_or(0, |max_index| max_index + 1);
            let mut published = vec![None; len];
            for (&index, &handle) in &self.recorded {
                published[index] = Some(handle);
            }
            self.published = published;
        }
        &self.published
    }

    /// The current published list.
    pub fn slices(&self) -> &[Option<SliceHandle>] {
        &self.published
    }

    /// The full ordered handle list once the current job is done.
    pub fn completed(&self) -> Option<&[SliceHandle]> {
        self.completed.as_deref()
    }

    /// Handles to export, one per cell in flat-index order.
    ///
    /// Only a finished job is exported. With no job the list is empty.
    pub fn export_handles(&self) -> Result<Vec<SliceHandle>, ExportError> {
        match (&self.completed, self.current) {
            (Some(handles), _) => Ok(handles.clone()),
            (None, None) => Ok(Vec::new()),
            (None, Some(job_id)) => Err(ExportError::InProgress { job_id }),
        }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    fn release(&mut self) {
        let mut released = self.store.revoke_all(self.recorded.values());
        if let Some(completed) = self.completed.take() {
            released += self.store.revoke_all(&completed);
        }
        if released > 0 {
            debug!(released, "Released slices");
        }
        self.recorded.clear();
        self.published.clear();
        self.publish_pending = false;
    }
}

impl Drop for SliceAssembler {
    fn drop(&mut self) {
        self.release();
    }
}

// =============================================================================
// Tests
// =============================================================================
