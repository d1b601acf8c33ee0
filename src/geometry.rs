//! Grid geometry.
//!
//! This module maps a source image and the user's grid parameters to the
//! concrete cell rectangles that get sliced and drawn.
//!
//! # Coordinate Model
//!
//! ```text
//!   offset_x
//!   ├──┤ margin_x
//!   │  ├───┤
//!   ┌──────────────────────────────────┐
//!   │      ┌──────┬──────┬──────┐      │
//!   │      │ 0    │ 1    │ 2    │      │   flat index = row * columns + column
//!   │      ├──────┼──────┼──────┤      │
//!   │      │ 3    │ 4    │ 5    │      │
//!   │      └──────┴──────┴──────┘      │
//!   └──────────────────────────────────┘
//! ```
//!
//! Cell `(row, column)` starts at
//! `(margin_x + offset_x + column * cell_width, margin_y + offset_y + row * cell_height)`.
//!
//! A grid whose row count, column count or cell size is not positive is
//! *void*: it renders nothing and slices nothing. Void grids are a normal
//! state, never an error.

use serde::{Deserialize, Serialize};

/// Default number of rows for a fresh grid.
pub const DEFAULT_ROWS: i32 = 4;

/// Default number of columns for a fresh grid.
pub const DEFAULT_COLUMNS: i32 = 4;

/// Cell size used before any image is loaded.
pub const DEFAULT_CELL_SIZE: i32 = 32;

// =============================================================================
// Geometry Calculator
// =============================================================================

/// Width and height of one grid cell, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: i32,
    pub height: i32,
}

impl CellSize {
    /// Whether both dimensions are positive.
    pub fn is_positive(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Compute the cell size for an image carved into `columns` x `rows` cells.
///
/// `width = floor((image_width - 2 * margin_x) / columns)` and likewise for
/// the height. The division floors towards negative infinity, so an image
/// smaller than its margins yields a negative size. A non-positive column
/// or row count yields 0 on that axis. Callers treat any non-positive
/// result as "no renderable grid".
pub fn calculate_cell_size(
    image_width: u32,
    image_height: u32,
    margin_x: i32,
    margin_y: i32,
    columns: i32,
    rows: i32,
) -> CellSize {
    CellSize {
        width: floor_span(image_width, margin_x, columns),
        height: floor_span(image_height, margin_y, rows),
    }
}

fn floor_span(extent: u32, margin: i32, count: i32) -> i32 {
    if count <= 0 {
        return 0;
    }
    let effective = i64::from(extent) - 2 * i64::from(margin);
    let size = effective.div_euclid(i64::from(count));
    size.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

// =============================================================================
// Grid Layout (user parameters)
// =============================================================================

/// The grid parameters as the user edits them.
///
/// The cell size is not part of the layout unless explicitly overridden;
/// [`GridLayout::resolve`] derives it from the image on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub rows: i32,
    pub columns: i32,
    pub margin_x: i32,
    pub margin_y: i32,
    pub offset_x: i32,
    pub offset_y: i32,

    /// Explicit cell size replacing the derived one
    #[serde(default)]
    pub cell_override: Option<CellSize>,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            columns: DEFAULT_COLUMNS,
            margin_x: 0,
            margin_y: 0,
            offset_x: 0,
            offset_y: 0,
            cell_override: None,
        }
    }
}

impl GridLayout {
    /// Resolve the layout against an image of the given size.
    pub fn resolve(&self, image_width: u32, image_height: u32) -> GridSpec {
        let cell = self.cell_override.unwrap_or_else(|| {
            calculate_cell_size(
                image_width,
                image_height,
                self.margin_x,
                self.margin_y,
                self.columns,
                self.rows,
            )
        });
        self.with_cell(cell)
    }

    /// Resolve the layout when no image is loaded yet.
    pub fn resolve_without_image(&self) -> GridSpec {
        let cell = self.cell_override.unwrap_or(CellSize {
            width: DEFAULT_CELL_SIZE,
            height: DEFAULT_CELL_SIZE,
        });
        self.with_cell(cell)
    }

    fn with_cell(&self, cell: CellSize) -> GridSpec {
        GridSpec {
            rows: self.rows,
            columns: self.columns,
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            cell_width: cell.width,
            cell_height: cell.height,
        }
    }
}

// =============================================================================
// Grid Spec (resolved)
// =============================================================================

/// A fully resolved grid: everything needed to crop or draw every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: i32,
    pub columns: i32,
    pub margin_x: i32,
    pub margin_y: i32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub cell_width: i32,
    pub cell_height: i32,
}

/// A cell rectangle in source pixels. The origin may be negative or lie
/// outside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

/// One cell of a grid with its position and flat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub column: u32,
    pub index: usize,
    pub rect: CellRect,
}

impl GridSpec {
    /// Whether the grid has nothing to render or slice.
    pub fn is_void(&self) -> bool {
        self.rows <= 0 || self.columns <= 0 || self.cell_width <= 0 || self.cell_height <= 0
    }

    /// Number of cells, 0 for a void grid.
    pub fn cell_count(&self) -> usize {
        if self.is_void() {
            0
        } else {
            self.rows as usize * self.columns as usize
        }
    }

    /// Row-major flat index of `(row, column)`.
    #[inline]
    pub fn flat_index(&self, row: u32, column: u32) -> usize {
        row as usize * self.columns.max(0) as usize + column as usize
    }

    /// Top-left corner of the grid in source pixels.
    pub fn origin(&self) -> (i64, i64) {
        (
            i64::from(self.margin_x) + i64::from(self.offset_x),
            i64::from(self.margin_y) + i64::from(self.offset_y),
        )
    }

    /// Crop rectangle of `(row, column)`.
    pub fn cell_rect(&self, row: u32, column: u32) -> CellRect {
        let (x0, y0) = self.origin();
        CellRect {
            x: x0 + i64::from(column) * i64::from(self.cell_width),
            y: y0 + i64::from(row) * i64::from(self.cell_height),
            width: self.cell_width.max(0) as u32,
            height: self.cell_height.max(0) as u32,
        }
    }

    /// Outer bound of the whole grid, `None` for a void grid.
    ///
    /// The size saturates at `u32::MAX` for grids too large to represent.
    pub fn bounds(&self) -> Option<CellRect> {
        if self.is_void() {
            return None;
        }
        let (x, y) = self.origin();
        Some(CellRect {
            x,
            y,
            width: span(self.columns, self.cell_width),
            height: span(self.rows, self.cell_height),
        })
    }

    /// Every cell in row-major order (columns in the inner loop).
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (rows, columns) = if self.is_void() {
            (0, 0)
        } else {
            (self.rows as u32, self.columns as u32)
        };
        (0..rows).flat_map(move |row| {
            (0..columns).map(move |column| Cell {
                row,
                column,
                index: self.flat_index(row, column),
                rect: self.cell_rect(row, column),
            })
        })
    }
}

/// `count` cells of `size` pixels, saturating at `u32::MAX`.
fn span(count: i32, size: i32) -> u32 {
    let pixels = i64::from(count) * i64::from(size);
    u32::try_from(pixels).unwrap_or(u32::MAX)
}

// =============================================================================
// Tests
// =============================================================================
