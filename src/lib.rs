//! # Anaglyph-Overlay
//!
//! Color-wash two videos and overlay one on the other with FFmpeg.
//!
//! The background video gets a red channel-mix wash, the overlay video a cyan
//! wash and half-size scaling; the overlay is centered on the background and
//! both audio tracks are merged to stereo. All of the media work is done by
//! the external engine; this library assembles the command, submits it
//! asynchronously and hands the result back on a designated main context.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anaglyph_overlay::{
//!     dispatch::MainQueue,
//!     engine::FfmpegProcessEngine,
//!     overlay::VideoOverlay,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let (main, mut main_loop) = MainQueue::new();
//! let overlay = VideoOverlay::new(Arc::new(FfmpegProcessEngine::default()), main);
//!
//! let job = overlay.overlay_videos_with_color_wash("left.mp4", "right.mp4", "anaglyph.mp4")?;
//! let outcome = main_loop.run_until(job.wait()).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`filter`] - Color washes and the fixed filtergraph
//! - [`command`] - Command assembly
//! - [`engine`] - Asynchronous execution of FFmpeg commands
//! - [`dispatch`] - Delivery onto the main context
//! - [`overlay`] - The overlay operation and its delegate
//! - [`config`] - Configuration management

pub mod command;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod filter;
pub mod overlay;

// Re-export commonly used types for convenience
pub use crate::{
    command::OverlayCommand,
    config::Config,
    dispatch::{MainHandle, MainLoop, MainQueue},
    engine::{FfmpegProcessEngine, MediaEngine},
    error::{OverlayError, Result},
    overlay::{OverlayDelegate, OverlayJob, OverlayOutcome, VideoOverlay},
};
