//! Job identifiers and the messages exchanged with the slice worker.
//!
//! ```text
//!   control thread                         worker
//!   ──────────────                         ──────
//!   WorkerMessage::Slice { job_id, .. } ──▶
//!                                      ◀── JobEvent::SliceReady { job_id, index, handle }  (0..n, any order)
//!                                      ◀── JobEvent::Done { job_id, handles }              (last)
//!                                      ◀── JobEvent::Failed { job_id }                     (or last)
//!   WorkerMessage::Terminate           ──▶
//! ```
//!
//! Every event carries the id of the job that produced it. Consumers compare
//! it against the current job and drop anything stale.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::geometry::GridSpec;
use crate::source::SourceImage;

use super::store::SliceHandle;

/// Monotonically increasing job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

impl JobId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// The identifier following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// One-way cancellation signal shared between the runner and the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Requests sent to the worker.
#[derive(Debug)]
pub enum WorkerMessage {
    /// Slice `image` along `grid` and report under `job_id`.
    Slice {
        job_id: JobId,
        image: SourceImage,
        grid: GridSpec,
        cancel: CancelToken,
    },

    /// Tear down the worker.
    Terminate,
}

/// Events reported by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// One cell has been cropped and encoded.
    SliceReady {
        job_id: JobId,
        index: usize,
        handle: SliceHandle,
    },

    /// The job finished; `handles` is in flat-index order.
    Done {
        job_id: JobId,
        handles: Vec<SliceHandle>,
    },

    /// A cell could not be produced at all; the job's slices were released.
    Failed { job_id: JobId },

    /// The worker died or could not be reached while `job_id` was running.
    WorkerLost { job_id: Option<JobId> },
}

impl JobEvent {
    /// The job this event belongs to, if any.
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            JobEvent::SliceReady { job_id, .. }
            | JobEvent::Done { job_id, .. }
            | JobEvent::Failed { job_id } => Some(*job_id),
            JobEvent::WorkerLost { job_id } => *job_id,
        }
    }
}
