//! # Filtergraph Module
//!
//! The fixed FFmpeg filtergraph used for the anaglyph overlay: a red
//! channel-mix wash on the background, a cyan wash plus half scale on the
//! overlay, a centered overlay and a two-input audio merge.

pub mod graph;
pub mod wash;

pub use graph::{FilterChain, FilterGraph, StreamKind};
pub use wash::{ColorWash, CYAN_WASH, RED_WASH};
