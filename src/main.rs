use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};

use anaglyph_overlay::{
    config::Config,
    dispatch::MainQueue,
    engine::FfmpegProcessEngine,
    error::OverlayError,
    overlay::{relocate_output, OverlayDelegate, OverlayOutcome, VideoOverlay},
};

#[derive(Parser)]
#[command(
    name = "anaglyph-overlay",
    version,
    about = "Overlay two videos with red and cyan color washes",
    long_about = "Anaglyph-Overlay washes the background video red and the overlay video cyan, scales the overlay to half size, centers it on the background and merges both audio tracks."
)]
struct Cli {
    /// Background video (red wash)
    #[arg(short, long)]
    background: PathBuf,

    /// Overlay video (cyan wash, half size, centered)
    #[arg(short = 'O', long)]
    overlay: PathBuf,

    /// Output file name, written to the scratch directory
    #[arg(short = 'n', long, default_value = "output_overlay_washed.mp4")]
    output_name: String,

    /// Scratch directory (defaults to the system temp directory)
    #[arg(short, long)]
    scratch_dir: Option<PathBuf>,

    /// Move the result here once it is done
    #[arg(short, long)]
    move_to: Option<PathBuf>,

    /// FFmpeg binary to run
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Configuration file (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Logs every notification; runs on the main thread
struct ConsoleDelegate;

impl OverlayDelegate for ConsoleDelegate {
    fn did_succeed(&self, output_path: &Path) {
        info!("Video overlay successful! Output path: {}", output_path.display());
    }

    fn did_fail(&self, error_message: &str) {
        error!("Video overlay failed: {}", error_message);
    }

    fn did_update_progress(&self, time_ms: i64, duration_ms: i64) {
        if duration_ms > 0 {
            let percent = (time_ms as f64 / duration_ms as f64 * 100.0).clamp(0.0, 100.0);
            info!("Progress: {:.1}% ({} / {} ms)", percent, time_ms, duration_ms);
        } else {
            info!("Progress: {} ms", time_ms);
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Anaglyph-Overlay v{}", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => Config::default(),
    };
    if let Some(dir) = cli.scratch_dir {
        config.output.scratch_dir = Some(dir);
    }
    if let Some(binary) = cli.ffmpeg {
        config.engine.ffmpeg_binary = binary;
    }
    config.validate()?;

    let engine = FfmpegProcessEngine::from_config(&config.engine);
    if let Err(e) = engine.ensure_available() {
        error!("{}", OverlayError::from(e).user_message());
        return Ok(ExitCode::FAILURE);
    }

    let (main, mut main_loop) = MainQueue::new();
    let overlay = VideoOverlay::new(Arc::new(engine), main)
        .with_config(config)
        .with_delegate(Arc::new(ConsoleDelegate));

    let job = match overlay.overlay_videos_with_color_wash(&cli.background, &cli.overlay, &cli.output_name) {
        Ok(job) => job,
        Err(e) => {
            error!("{}", e.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    // Delegate notifications run here, on the main thread
    let outcome = main_loop.run_until(job.wait()).await?;

    match (outcome, cli.move_to) {
        (OverlayOutcome::Succeeded { output_path }, Some(destination)) => {
            relocate_output(&output_path, &destination).await?;
            Ok(ExitCode::SUCCESS)
        }
        (OverlayOutcome::Succeeded { .. }, None) => Ok(ExitCode::SUCCESS),
        _ => Ok(ExitCode::FAILURE),
    }
}
