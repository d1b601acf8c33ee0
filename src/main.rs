//! Sprite Slicer - carve sprite sheets into uniform grids of cells.
//!
//! This binary drives the slicing pipeline and the preview renderer from
//! the command line.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sprite_slicer::{
    config::{Cli, Command, GridConfig, PreviewConfig, SliceConfig},
    PreviewRenderer, Slicer, SlicerUpdate, SourceImage,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Slice(config) => run_slice(config).await,
        Command::Preview(config) => run_preview(config),
        Command::Grid(config) => run_grid(config),
    }
}

// =============================================================================
// Slice Command
// =============================================================================

async fn run_slice(config: SliceConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(image) = open_image(&config.input) else {
        return ExitCode::FAILURE;
    };

    let mut slicer = Slicer::new(config.timing.options());
    slicer.set_layout(config.grid.layout());
    slicer.set_image(image);

    loop {
        match slicer.next_update().await {
            SlicerUpdate::JobStarted { job_id, grid } => {
                info!(
                    "Slicing {} ({}x{} cells of {}x{} px)",
                    job_id, grid.columns, grid.rows, grid.cell_width, grid.cell_height
                );
            }
            SlicerUpdate::Published { len, .. } => {
                debug!("{} slice(s) published", len);
            }
            SlicerUpdate::Completed { count, .. } => {
                if count == 0 {
                    warn!("Grid has no renderable cells; the archive will be empty");
                }
                break;
            }
            SlicerUpdate::Cleared => {
                error!("Slicing failed before the job completed");
                slicer.shutdown();
                return ExitCode::FAILURE;
            }
        }
    }

    let archive = match slicer.export().await {
        Ok(archive) => archive,
        Err(e) => {
            error!("Failed to build archive: {}", e);
            slicer.shutdown();
            return ExitCode::FAILURE;
        }
    };
    let count = slicer.slices().len();
    slicer.shutdown();

    if let Err(e) = tokio::fs::write(&config.output, &archive).await {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {} slice(s) to {} ({} bytes)",
        count,
        config.output.display(),
        archive.len()
    );
    ExitCode::SUCCESS
}

// =============================================================================
// Preview Command
// =============================================================================

fn run_preview(config: PreviewConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(image) = open_image(&config.input) else {
        return ExitCode::FAILURE;
    };

    let grid = config.grid.layout().resolve(image.width(), image.height());
    if grid.is_void() {
        warn!("Grid has no renderable cells; drawing the bare image");
    }

    let mut renderer = PreviewRenderer::new(config.metrics());
    for _ in 1..config.frames {
        renderer.render_frame(&image, &grid, config.theme);
    }
    let frame = renderer.render_frame(&image, &grid, config.theme);

    if let Err(e) = frame.save(&config.output) {
        error!("Failed to write {}: {}", config.output.display(), e);
        return ExitCode::FAILURE;
    }

    info!(
        "Wrote {}x{} preview to {}",
        frame.width(),
        frame.height(),
        config.output.display()
    );
    ExitCode::SUCCESS
}

// =============================================================================
// Grid Command
// =============================================================================

fn run_grid(config: GridConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(image) = open_image(&config.input) else {
        return ExitCode::FAILURE;
    };

    let grid = config.grid.layout().resolve(image.width(), image.height());
    match serde_json::to_string_pretty(&grid) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to serialize grid: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn open_image(path: &std::path::Path) -> Option<SourceImage> {
    match SourceImage::open(path) {
        Ok(image) => {
            info!("Loaded {} ({}x{})", path.display(), image.width(), image.height());
            Some(image)
        }
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "sprite_slicer=debug"
    } else {
        "sprite_slicer=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
