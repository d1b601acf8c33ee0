//! Drag the grid across the preview.
//!
//! Pointer positions are in logical (image) pixels; convert surface
//! coordinates with [`SurfaceMetrics::to_logical`](super::SurfaceMetrics::to_logical)
//! first. The resulting offset is rounded to whole pixels and goes through
//! the normal edit path, so dragging is debounced like any other edit.

/// An in-progress pointer drag moving the grid offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetDrag {
    pointer: (f32, f32),
    offset: (i32, i32),
}

impl OffsetDrag {
    /// Start dragging at `pointer` with the grid at `offset`.
    pub fn begin(pointer: (f32, f32), offset: (i32, i32)) -> Self {
        Self { pointer, offset }
    }

    /// Offset for the pointer now at `pointer`.
    pub fn update(&self, pointer: (f32, f32)) -> (i32, i32) {
        let dx = (pointer.0 - self.pointer.0).round() as i32;
        let dy = (pointer.1 - self.pointer.1).round() as i32;
        (self.offset.0 + dx, self.offset.1 + dy)
    }
}
