use std::fmt;

use crate::filter::wash::{CYAN_WASH, RED_WASH};

/// Label of the red-washed background stream
pub const BACKGROUND_LABEL: &str = "v0_red";
/// Label of the cyan-washed, half-scaled overlay stream
pub const OVERLAY_LABEL: &str = "v1_cyan_scaled";
/// Label of the composited video stream
pub const VIDEO_OUT_LABEL: &str = "v_out";
/// Label of the merged audio stream
pub const AUDIO_OUT_LABEL: &str = "a_out";

/// Kind of stream a filter chain produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

/// One `;`-separated chain: `[in]...filter,filter[out]`
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    pub inputs: Vec<String>,
    pub filters: Vec<String>,
    pub output: String,
    pub kind: StreamKind,
}

impl FilterChain {
    fn new(kind: StreamKind, inputs: &[&str], filters: Vec<String>, output: &str) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            filters,
            output: output.to_string(),
            kind,
        }
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        write!(f, "{}[{}]", self.filters.join(","), self.output)
    }
}

/// A complete `-filter_complex` graph
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    chains: Vec<FilterChain>,
}

impl FilterGraph {
    /// The anaglyph overlay graph
    ///
    /// Input 0 is washed red, input 1 is washed cyan and halved in both
    /// dimensions, then centered on input 0. Both audio tracks are merged.
    pub fn color_wash_overlay() -> Self {
        Self {
            chains: vec![
                FilterChain::new(
                    StreamKind::Video,
                    &["0:v"],
                    vec![RED_WASH.to_string()],
                    BACKGROUND_LABEL,
                ),
                FilterChain::new(
                    StreamKind::Video,
                    &["1:v"],
                    vec![CYAN_WASH.to_string(), "scale=iw/2:ih/2".to_string()],
                    OVERLAY_LABEL,
                ),
                FilterChain::new(
                    StreamKind::Video,
                    &[BACKGROUND_LABEL, OVERLAY_LABEL],
                    vec!["overlay=(main_w-overlay_w)/2:(main_h-overlay_h)/2".to_string()],
                    VIDEO_OUT_LABEL,
                ),
                FilterChain::new(
                    StreamKind::Audio,
                    &["0:a", "1:a"],
                    vec!["amerge=inputs=2".to_string()],
                    AUDIO_OUT_LABEL,
                ),
            ],
        }
    }

    pub fn chains(&self) -> &[FilterChain] {
        &self.chains
    }

    /// Labels produced by the chains of the given kind, in graph order
    pub fn labels(&self, kind: StreamKind) -> Vec<&str> {
        self.chains
            .iter()
            .filter(|chain| chain.kind == kind)
            .map(|chain| chain.output.as_str())
            .collect()
    }

    /// Final video label, i.e. the one no other chain consumes
    pub fn video_output(&self) -> Option<&str> {
        self.terminal_label(StreamKind::Video)
    }

    /// Final audio label
    pub fn audio_output(&self) -> Option<&str> {
        self.terminal_label(StreamKind::Audio)
    }

    fn terminal_label(&self, kind: StreamKind) -> Option<&str> {
        self.labels(kind).into_iter().find(|label| {
            !self
                .chains
                .iter()
                .any(|chain| chain.inputs.iter().any(|input| input == label))
        })
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chains: Vec<String> = self.chains.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", chains.join(";"))
    }
}
