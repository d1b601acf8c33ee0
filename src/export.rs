//! Archive export.
//!
//! Packs an ordered list of slice handles into one zip archive. Entry `n`
//! (1-based, in list order) is named `slice_<n>.png` and holds the slice's
//! PNG bytes unchanged. Cells are already compressed, so entries are stored.
//!
//! The export only borrows the handles; it never revokes anything.

use std::io::{Cursor, Write};

use bytes::Bytes;
use tokio::task;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ExportError;
use crate::slice::{BlobStore, SliceHandle};

/// Default file name for a downloaded archive.
pub const ARCHIVE_FILE_NAME: &str = "sprites.zip";

/// File name of the slice at 0-based `position`.
pub fn slice_file_name(position: usize) -> String {
    format!("slice_{}.png", position + 1)
}

/// Build the archive synchronously.
///
/// Fails if any handle has already been revoked.
pub fn build_archive(store: &BlobStore, handles: &[SliceHandle]) -> Result<Bytes, ExportError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

    for (position, &handle) in handles.iter().enumerate() {
        let data = store
            .get(handle)
            .ok_or(ExportError::MissingSlice { position, handle })?;
        writer.start_file(slice_file_name(position), options)?;
        writer.write_all(&data)?;
    }

    let cursor = writer.finish()?;
    Ok(Bytes::from(cursor.into_inner()))
}

/// Build the archive on the blocking pool.
pub async fn export_archive(
    store: BlobStore,
    handles: Vec<SliceHandle>,
) -> Result<Bytes, ExportError> {
    let count = handles.len();
    let result = task::spawn_blocking(move || build_archive(&store, &handles))
        .await
        .map_err(|e| ExportError::Task {
            message: e.to_string(),
        })?;

    match &result {
        Ok(archive) => info!(slices = count, bytes = archive.len(), "Archive built"),
        Err(e) => warn!(slices = count, error = %e, "Archive export failed"),
    }
    result
}

// =============================================================================
// Tests
// =============================================================================
