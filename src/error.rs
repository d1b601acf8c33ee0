use thiserror::Error;

use crate::slice::{JobId, SliceHandle};

/// Errors raised while ingesting a source image.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The image file could not be read
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    /// The bytes could not be decoded into a raster
    #[error("Failed to decode image: {message}")]
    Decode { message: String },

    /// The decoded image has a zero dimension
    #[error("Image has no pixels: {width}x{height}")]
    Empty { width: u32, height: u32 },
}

/// Error encoding one cropped cell.
///
/// The encoder degrades a failed crop to a blank cell. Only a blank cell
/// that fails as well aborts the job.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// The PNG encoder rejected the raster
    #[error("PNG encode error: {message}")]
    Png { message: String },
}

/// Errors that can occur while building an export archive.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The current job has not delivered every slice yet
    #[error("Slicing is still in progress ({job_id})")]
    InProgress { job_id: JobId },

    /// A handle in the export list no longer resolves to content
    #[error("Slice {position} ({handle}) has been released")]
    MissingSlice {
        position: usize,
        handle: SliceHandle,
    },

    /// The zip writer failed
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Writing entry content failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking archive task did not complete
    #[error("Export task failed: {message}")]
    Task { message: String },
}

/// Errors reaching the slice worker.
///
/// The runner never surfaces these; a job that cannot be dispatched is
/// reported downstream as a lost worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker thread could not be started
    #[error("Failed to spawn slice worker: {0}")]
    Spawn(#[from] std::io::Error),

    /// The worker stopped accepting messages
    #[error("Slice worker is not accepting messages")]
    Disconnected,
}
