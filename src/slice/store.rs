//! Blob store for encoded slices.
//!
//! Encoded cells live here and are addressed by an opaque [`SliceHandle`],
//! the way a browser hands out object URLs. A handle stays resolvable until
//! it is explicitly revoked; whoever owns the handle (the worker while a job
//! runs, the assembler once it is published) is responsible for revoking it.
//!
//! # Size Tracking
//!
//! The store tracks the total number of bytes it holds so callers can check
//! that superseded jobs actually released their content.
//!
//! # Thread Safety
//!
//! The store is shared between the worker's crop pool and the control
//! thread. All methods take `&self`; clones share the same storage.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;

/// Opaque reference to an encoded slice in a [`BlobStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceHandle(u64);

impl SliceHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SliceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:slice/{}", self.0)
    }
}

#[derive(Default)]
struct Inner {
    blobs: HashMap<SliceHandle, Bytes>,
    size: usize,
}

/// Shared registry of encoded slice bytes.
#[derive(Clone, Default)]
pub struct BlobStore {
    inner: Arc<RwLock<Inner>>,
    next_id: Arc<AtomicU64>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` and return a fresh handle for it.
    pub fn insert(&self, data: Bytes) -> SliceHandle {
        let handle = SliceHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.size += data.len();
        inner.blobs.insert(handle, data);
        handle
    }

    /// Content behind `handle`, `None` once revoked.
    pub fn get(&self, handle: SliceHandle) -> Option<Bytes> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blobs.get(&handle).cloned()
    }

    pub fn contains(&self, handle: SliceHandle) -> bool {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blobs.contains_key(&handle)
    }

    /// Release `handle`. Revoking an unknown or already revoked handle is a
    /// no-op.
    pub fn revoke(&self, handle: SliceHandle) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        match inner.blobs.remove(&handle) {
            Some(data) => {
                inner.size = inner.size.saturating_sub(data.len());
                true
            }
            None => false,
        }
    }

    /// Release every handle in `handles`, returning how many were live.
    pub fn revoke_all<'a>(&self, handles: impl IntoIterator<Item = &'a SliceHandle>) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut released = 0;
        for handle in handles {
            if let Some(data) = inner.blobs.remove(handle) {
                inner.size = inner.size.saturating_sub(data.len());
                released += 1;
            }
        }
        released
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes held by live handles.
    pub fn size(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.size
    }
}

impl fmt::Debug for BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobStore")
            .field("len", &self.len())
            .field("size", &self.size())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
