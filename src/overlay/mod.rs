//! # Overlay Module
//!
//! The color-wash overlay operation: validates inputs, submits the fixed
//! command to a [`MediaEngine`](crate::engine::MediaEngine) and relays the
//! result to an [`OverlayDelegate`] on the main context.

pub mod delegate;
pub mod persist;
pub mod video_overlay;

pub use delegate::{OverlayDelegate, OverlayOutcome, CANCELLED_MESSAGE, UNKNOWN_ERROR_MESSAGE};
pub use persist::relocate_output;
pub use video_overlay::{classify_session, OverlayJob, VideoOverlay};
