use std::path::{Path, PathBuf};

/// Observer for overlay results
///
/// Every method is invoked on the main context, i.e. on whichever thread
/// drives the [`MainLoop`](crate::dispatch::MainLoop).
pub trait OverlayDelegate: Send + Sync {
    /// The output file was written to `output_path`
    fn did_succeed(&self, output_path: &Path);

    /// The overlay failed or was cancelled
    fn did_fail(&self, error_message: &str);

    /// Engine progress; `duration_ms` is 0 while the input duration is unknown
    fn did_update_progress(&self, time_ms: i64, duration_ms: i64) {
        let _ = (time_ms, duration_ms);
    }
}

pub const CANCELLED_MESSAGE: &str = "Operation cancelled.";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown FFmpeg error.";

/// Terminal result of one overlay job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
    Succeeded { output_path: PathBuf },
    Cancelled,
    Failed { message: String },
}

impl OverlayOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Succeeded { output_path } => Some(output_path.as_path()),
            _ => None,
        }
    }

    /// Text handed to [`OverlayDelegate::did_fail`]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Succeeded { .. } => None,
            Self::Cancelled => Some(CANCELLED_MESSAGE),
            Self::Failed { message } => Some(message.as_str()),
        }
    }

    /// Deliver this outcome to `delegate`
    pub fn notify(&self, delegate: &dyn OverlayDelegate) {
        match self {
            Self::Succeeded { output_path } => delegate.did_succeed(output_path),
            Self::Cancelled => delegate.did_fail(CANCELLED_MESSAGE),
            Self::Failed { message } => delegate.did_fail(message),
        }
    }
}
