use std::path::{Path, PathBuf};

use crate::engine::quote_argument;
use crate::filter::FilterGraph;

/// The complete FFmpeg invocation for one overlay
///
/// All parameters besides the three paths are fixed: the color-wash
/// filtergraph, both map labels, stereo output and overwrite.
#[derive(Debug, Clone)]
pub struct OverlayCommand {
    background: PathBuf,
    overlay: PathBuf,
    output: PathBuf,
    graph: FilterGraph,
}

impl OverlayCommand {
    pub fn new(
        background: impl Into<PathBuf>,
        overlay: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            background: background.into(),
            overlay: overlay.into(),
            output: output.into(),
            graph: FilterGraph::color_wash_overlay(),
        }
    }

    pub fn background(&self) -> &Path {
        &self.background
    }

    pub fn overlay(&self) -> &Path {
        &self.overlay
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn graph(&self) -> &FilterGraph {
        &self.graph
    }

    fn map_labels(&self) -> [String; 2] {
        let video = self.graph.video_output().unwrap_or_default();
        let audio = self.graph.audio_output().unwrap_or_default();
        [format!("[{}]", video), format!("[{}]", audio)]
    }

    /// Argument vector form, without the program name
    pub fn args(&self) -> Vec<String> {
        let [video_map, audio_map] = self.map_labels();
        vec![
            "-i".to_string(),
            self.background.to_string_lossy().into_owned(),
            "-i".to_string(),
            self.overlay.to_string_lossy().into_owned(),
            "-filter_complex".to_string(),
            self.graph.to_string(),
            "-map".to_string(),
            video_map,
            "-map".to_string(),
            audio_map,
            "-ac".to_string(),
            "2".to_string(),
            "-y".to_string(),
            self.output.to_string_lossy().into_owned(),
        ]
    }

    /// Single-string form submitted to the engine
    ///
    /// Paths, the graph and map labels are double-quoted; paths containing a
    /// double quote cannot be expressed in this form.
    pub fn to_command_line(&self) -> String {
        let [video_map, audio_map] = self.map_labels();
        format!(
            "-i {} -i {} -filter_complex {} -map {} -map {} -ac 2 -y {}",
            quote_argument(&self.background.to_string_lossy()),
            quote_argument(&self.overlay.to_string_lossy()),
            quote_argument(&self.graph.to_string()),
            quote_argument(&video_map),
            quote_argument(&audio_map),
            quote_argument(&self.output.to_string_lossy()),
        )
    }
}
