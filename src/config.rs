//! Configuration for the sprite-slicer binary.
//!
//! This module provides the command-line interface:
//! - Subcommands for slicing, previewing and inspecting a grid
//! - Environment variables with `SLICER_` prefix for every tunable
//! - Defaults taken from the library constants
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use sprite_slicer::config::{Cli, Command};
//!
//! let cli = Cli::parse();
//! if let Command::Slice(config) = cli.command {
//!     println!("Writing {}", config.output.display());
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `SLICER_ROWS` / `SLICER_COLUMNS` - Grid size (default: 4 x 4)
//! - `SLICER_MARGIN_X` / `SLICER_MARGIN_Y` - Margins (default: 0)
//! - `SLICER_OFFSET_X` / `SLICER_OFFSET_Y` - Grid offset (default: 0)
//! - `SLICER_CELL_WIDTH` / `SLICER_CELL_HEIGHT` - Explicit cell size
//! - `SLICER_IDLE_THRESHOLD_MS` - Gap that ends a drag (default: 200)
//! - `SLICER_SHORT_DELAY_MS` - Debounce while dragging (default: 50)
//! - `SLICER_LONG_DELAY_MS` - Debounce for isolated edits (default: 300)
//! - `SLICER_FRAME_INTERVAL_MS` - Display refresh interval (default: 16)
//! - `SLICER_DEVICE_PIXEL_RATIO` - Preview pixel density (default: 1.0)
//! - `SLICER_THEME` - Preview theme, `light` or `dark` (default: light)

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::export::ARCHIVE_FILE_NAME;
use crate::geometry::{CellSize, GridLayout, DEFAULT_COLUMNS, DEFAULT_ROWS};
use crate::preview::{SurfaceMetrics, Theme};
use crate::slice::{
    DebounceConfig, SlicerOptions, DEFAULT_FRAME_INTERVAL, DEFAULT_IDLE_THRESHOLD,
    DEFAULT_LONG_DELAY, DEFAULT_SHORT_DELAY,
};

// =============================================================================
// Default Values
// =============================================================================

/// Default preview output file.
pub const DEFAULT_PREVIEW_FILE: &str = "preview.png";

/// Default number of preview frames to render.
pub const DEFAULT_PREVIEW_FRAMES: u32 = 1;

/// Default device pixel ratio.
pub const DEFAULT_DEVICE_PIXEL_RATIO: f32 = 1.0;

/// Largest explicit cell, in pixels (8192 x 8192).
pub const MAX_CELL_PIXELS: i64 = 1 << 26;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Sprite Slicer - carve sprite sheets into uniform grids of cells.
#[derive(Parser, Debug, Clone)]
#[command(name = "sprite-slicer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Slice an image and write every cell into a zip archive.
    Slice(SliceConfig),

    /// Render the grid overlay on top of an image.
    Preview(PreviewConfig),

    /// Print the resolved grid for an image as JSON.
    Grid(GridConfig),
}

/// Grid parameters shared by every subcommand.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct GridArgs {
    /// Number of rows.
    #[arg(long, default_value_t = DEFAULT_ROWS, env = "SLICER_ROWS")]
    pub rows: i32,

    /// Number of columns.
    #[arg(long, default_value_t = DEFAULT_COLUMNS, env = "SLICER_COLUMNS")]
    pub columns: i32,

    /// Horizontal margin on each side, in pixels.
    #[arg(long, default_value_t = 0, env = "SLICER_MARGIN_X")]
    pub margin_x: i32,

    /// Vertical margin on each side, in pixels.
    #[arg(long, default_value_t = 0, env = "SLICER_MARGIN_Y")]
    pub margin_y: i32,

    /// Horizontal grid offset, in pixels.
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        env = "SLICER_OFFSET_X"
    )]
    pub offset_x: i32,

    /// Vertical grid offset, in pixels.
    #[arg(
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        env = "SLICER_OFFSET_Y"
    )]
    pub offset_y: i32,

    /// Explicit cell width (requires --cell-height).
    #[arg(long, env = "SLICER_CELL_WIDTH")]
    pub cell_width: Option<i32>,

    /// Explicit cell height (requires --cell-width).
    #[arg(long, env = "SLICER_CELL_HEIGHT")]
    pub cell_height: Option<i32>,
}

impl GridArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.rows < 1 || self.columns < 1 {
            return Err("rows and columns must be at least 1".to_string());
        }
        if self.margin_x < 0 || self.margin_y < 0 {
            return Err("margins must not be negative".to_string());
        }
        match (self.cell_width, self.cell_height) {
            (Some(w), Some(h)) if w < 1 || h < 1 => {
                Err("cell width and height must be at least 1".to_string())
            }
            (Some(w), Some(h)) if i64::from(w) * i64::from(h) > MAX_CELL_PIXELS => {
                Err(format!("cell area must not exceed {MAX_CELL_PIXELS} pixels"))
            }
            (Some(_), None) | (None, Some(_)) => {
                Err("--cell-width and --cell-height must be given together".to_string())
            }
            _ => Ok(()),
        }
    }

    /// The layout these arguments describe.
    pub fn layout(&self) -> GridLayout {
        let cell_override = match (self.cell_width, self.cell_height) {
            (Some(width), Some(height)) => Some(CellSize { width, height }),
            _ => None,
        };
        GridLayout {
            rows: self.rows,
            columns: self.columns,
            margin_x: self.margin_x,
            margin_y: self.margin_y,
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            cell_override,
        }
    }
}

/// Pipeline timing.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct TimingArgs {
    /// Gap between edits below which they count as one drag, in ms.
    #[arg(
        long,
        default_value_t = DEFAULT_IDLE_THRESHOLD.as_millis() as u64,
        env = "SLICER_IDLE_THRESHOLD_MS"
    )]
    pub idle_threshold_ms: u64,

    /// Re-slice delay while dragging, in ms.
    #[arg(
        long,
        default_value_t = DEFAULT_SHORT_DELAY.as_millis() as u64,
        env = "SLICER_SHORT_DELAY_MS"
    )]
    pub short_delay_ms: u64,

    /// Re-slice delay for isolated edits, in ms.
    #[arg(
        long,
        default_value_t = DEFAULT_LONG_DELAY.as_millis() as u64,
        env = "SLICER_LONG_DELAY_MS"
    )]
    pub long_delay_ms: u64,

    /// Display refresh interval, in ms.
    #[arg(
        long,
        default_value_t = DEFAULT_FRAME_INTERVAL.as_millis() as u64,
        env = "SLICER_FRAME_INTERVAL_MS"
    )]
    pub frame_interval_ms: u64,
}

impl TimingArgs {
    pub fn validate(&self) -> Result<(), String> {
        self.options().debounce.validate()?;
        if self.frame_interval_ms == 0 {
            return Err("frame_interval_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    pub fn options(&self) -> SlicerOptions {
        SlicerOptions {
            debounce: DebounceConfig {
                idle_threshold: Duration::from_millis(self.idle_threshold_ms),
                short_delay: Duration::from_millis(self.short_delay_ms),
                long_delay: Duration::from_millis(self.long_delay_ms),
            },
            frame_interval: Duration::from_millis(self.frame_interval_ms),
        }
    }
}

/// `slice` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SliceConfig {
    /// Sprite sheet to slice (PNG or JPEG).
    pub input: PathBuf,

    /// Archive to write.
    #[arg(short, long, default_value = ARCHIVE_FILE_NAME)]
    pub output: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub timing: TimingArgs,
}

impl SliceConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()?;
        self.timing.validate()
    }
}

/// `preview` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PreviewConfig {
    /// Sprite sheet to preview.
    pub input: PathBuf,

    /// PNG file receiving the last rendered frame.
    #[arg(short, long, default_value = DEFAULT_PREVIEW_FILE)]
    pub output: PathBuf,

    /// Number of animation frames to render.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_FRAMES)]
    pub frames: u32,

    /// Pixel density of the render surface.
    #[arg(
        long,
        default_value_t = DEFAULT_DEVICE_PIXEL_RATIO,
        env = "SLICER_DEVICE_PIXEL_RATIO"
    )]
    pub device_pixel_ratio: f32,

    /// Overlay colour scheme.
    #[arg(long, value_enum, default_value_t = Theme::Light, env = "SLICER_THEME")]
    pub theme: Theme,

    #[command(flatten)]
    pub grid: GridArgs,
}

impl PreviewConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()?;
        if self.frames == 0 {
            return Err("frames must be greater than 0".to_string());
        }
        if !self.device_pixel_ratio.is_finite() || self.device_pixel_ratio <= 0.0 {
            return Err("device_pixel_ratio must be a positive number".to_string());
        }
        Ok(())
    }

    pub fn metrics(&self) -> SurfaceMetrics {
        SurfaceMetrics::new(self.device_pixel_ratio)
    }
}

/// `grid` subcommand.
#[derive(Args, Debug, Clone)]
pub struct GridConfig {
    /// Sprite sheet whose size the grid is resolved against.
    pub input: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.grid.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
