//! # Media Engine Module
//!
//! The asynchronous execution facility the overlay submits its command to.
//! A [`MediaEngine`] accepts a command string and three callbacks and runs
//! the command somewhere else; the callbacks fire on whatever thread the
//! engine happens to use.
//!
//! [`FfmpegProcessEngine`] runs the system `ffmpeg` binary as a child process
//! on the Tokio runtime.

pub mod args;
pub mod process;
pub mod stats;
pub mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

pub use args::{parse_arguments, quote_argument};
pub use process::FfmpegProcessEngine;
pub use stats::{parse_duration, parse_statistics};
pub use types::{LogLine, ReturnCode, Session, SessionState, Statistics};

pub type CompleteCallback = Box<dyn FnOnce(Session) + Send + 'static>;
pub type LogCallback = Box<dyn Fn(LogLine) + Send + Sync + 'static>;
pub type StatisticsCallback = Box<dyn Fn(Statistics) + Send + Sync + 'static>;

/// Hooks registered for one execution
pub struct SessionCallbacks {
    /// Called exactly once with the finished session
    pub complete: CompleteCallback,
    pub log: LogCallback,
    pub statistics: StatisticsCallback,
}

impl SessionCallbacks {
    /// Callbacks that only observe completion
    pub fn on_complete<F>(complete: F) -> Self
    where
        F: FnOnce(Session) + Send + 'static,
    {
        Self {
            complete: Box::new(complete),
            log: Box::new(|_| {}),
            statistics: Box::new(|_| {}),
        }
    }
}

/// An engine that runs media commands asynchronously
pub trait MediaEngine: Send + Sync {
    /// Submit `command` and return immediately
    fn execute_async(&self, command: &str, callbacks: SessionCallbacks) -> SessionHandle;
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-wide unique session id
pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to a submitted session
///
/// Cancellation belongs to whoever holds the handle; the engine reports a
/// cancelled session with [`ReturnCode::CANCEL`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: u64,
    cancel: Arc<Notify>,
}

impl SessionHandle {
    pub fn new(session_id: u64, cancel: Arc<Notify>) -> Self {
        Self { session_id, cancel }
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Ask the engine to stop the session
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = next_session_id();
        let b = next_session_id();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_cancel_before_wait_is_remembered() {
        let notify = Arc::new(Notify::new());
        let handle = SessionHandle::new(1, notify.clone());
        handle.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), notify.notified())
            .await
            .unwrap();
    }
}
