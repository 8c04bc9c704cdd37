use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::engine::{
    next_session_id, parse_arguments, parse_duration, parse_statistics, LogLine, MediaEngine,
    ReturnCode, Session, SessionCallbacks, SessionHandle,
};

/// Runs commands through the system `ffmpeg` binary
///
/// Each submission spawns one child process on a Tokio runtime: the one given
/// to [`with_runtime`](Self::with_runtime), else the one current when the
/// engine was built, else the one current at submission. With none of these
/// the session completes as failed instead of running.
#[derive(Debug, Clone)]
pub struct FfmpegProcessEngine {
    binary: PathBuf,
    log_level: Option<String>,
    hide_banner: bool,
    runtime: Option<Handle>,
}

impl Default for FfmpegProcessEngine {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegProcessEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            log_level: None,
            hide_banner: true,
            runtime: Handle::try_current().ok(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            log_level: config.log_level.clone(),
            ..Self::new(config.ffmpeg_binary.clone())
        }
    }

    /// Pass `-hide_banner` ahead of the command (on by default)
    pub fn with_hide_banner(mut self, hide_banner: bool) -> Self {
        self.hide_banner = hide_banner;
        self
    }

    /// Run sessions on `runtime`, so submissions may come from any thread
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Check that the binary runs at all
    pub fn is_available(&self) -> bool {
        std::process::Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// [`is_available`](Self::is_available) as an error naming the binary
    pub fn ensure_available(&self) -> Result<(), EngineError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(EngineError::NotAvailable {
                binary: self.binary.display().to_string(),
            })
        }
    }

    /// Full argument list handed to the binary
    pub fn build_args(&self, command: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.hide_banner {
            args.push("-hide_banner".to_string());
        }
        if let Some(level) = &self.log_level {
            args.push("-loglevel".to_string());
            args.push(level.clone());
        }
        args.extend(parse_arguments(command));
        args
    }
}

impl MediaEngine for FfmpegProcessEngine {
    fn execute_async(&self, command: &str, callbacks: SessionCallbacks) -> SessionHandle {
        let mut session = Session::new(next_session_id(), command);
        let cancel = Arc::new(Notify::new());
        let handle = SessionHandle::new(session.id(), cancel.clone());

        let runtime = self.runtime.clone().or_else(|| Handle::try_current().ok());
        match runtime {
            Some(runtime) => {
                let binary = self.binary.clone();
                let args = self.build_args(command);
                runtime.spawn(run_session(binary, args, session, callbacks, cancel));
            }
            None => {
                warn!("Session {} has no Tokio runtime to run on", session.id());
                session.fail(format!(
                    "No Tokio runtime available to run {}",
                    self.binary.display()
                ));
                (callbacks.complete)(session);
            }
        }

        handle
    }
}

async fn run_session(
    binary: PathBuf,
    args: Vec<String>,
    mut session: Session,
    callbacks: SessionCallbacks,
    cancel: Arc<Notify>,
) {
    let SessionCallbacks { complete, log, statistics } = callbacks;
    let session_id = session.id();

    session.start();
    debug!("Session {} starting {:?} with {} arguments", session_id, binary, args.len());

    let spawned = Command::new(&binary)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            warn!("Session {} could not start {:?}: {}", session_id, binary, e);
            session.fail(format!("Failed to start {}: {}", binary.display(), e));
            complete(session);
            return;
        }
    };

    let mut cancelled = false;
    let mut duration_ms: Option<i64> = None;
    let mut lines = LineBuffer::default();

    let mut handle_line = |session: &mut Session, line: String| {
        if duration_ms.is_none() {
            duration_ms = parse_duration(&line);
        }
        if let Some(mut stats) = parse_statistics(&line) {
            stats.session_id = session_id;
            stats.duration_ms = duration_ms;
            statistics(stats);
        }
        session.append_output(&line);
        log(LogLine { session_id, message: line });
    };

    // Cancel stays armed until the child is reaped, even after stderr closes.
    let mut stderr = child.stderr.take();
    let mut reading = stderr.is_some();
    let mut buf = [0u8; 4096];
    let waited = loop {
        tokio::select! {
            read = read_stderr(&mut stderr, &mut buf), if reading => match read {
                Ok(0) => reading = false,
                Ok(n) => {
                    for line in lines.push(&buf[..n]) {
                        handle_line(&mut session, line);
                    }
                }
                Err(e) => {
                    warn!("Session {} stopped reading engine output: {}", session_id, e);
                    reading = false;
                }
            },
            _ = cancel.notified(), if !cancelled => {
                debug!("Session {} cancel requested", session_id);
                cancelled = true;
                if let Err(e) = child.start_kill() {
                    warn!("Session {} could not be killed: {}", session_id, e);
                }
            }
            status = child.wait() => break status,
        }
    };

    // Whatever the child wrote just before exiting
    if let Some(stderr) = stderr.as_mut().filter(|_| reading) {
        let mut rest = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut rest).await {
            warn!("Session {} lost trailing engine output: {}", session_id, e);
        }
        for line in lines.push(&rest) {
            handle_line(&mut session, line);
        }
    }
    if let Some(line) = lines.finish() {
        handle_line(&mut session, line);
    }

    match waited {
        Ok(status) => {
            trace!("Session {} exited with {}", session_id, status);
            match status.code() {
                _ if cancelled => session.complete(ReturnCode::CANCEL),
                Some(code) => session.complete(ReturnCode::new(code)),
                None => {
                    let reason = describe_termination(status);
                    warn!("Session {} {}", session_id, reason);
                    session.fail(format!("{} {}", binary.display(), reason));
                }
            }
        }
        Err(e) => session.fail(format!("Failed to wait for {}: {}", binary.display(), e)),
    }

    complete(session);
}

async fn read_stderr(stderr: &mut Option<ChildStderr>, buf: &mut [u8]) -> std::io::Result<usize> {
    match stderr {
        Some(stderr) => stderr.read(buf).await,
        None => Ok(0),
    }
}

/// Why a child without an exit code stopped
fn describe_termination(status: ExitStatus) -> String {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("was terminated by signal {}", signal);
        }
    }
    format!("terminated abnormally ({})", status)
}

/// Splits engine output on `\n` and `\r`
///
/// Progress lines are terminated by a carriage return only, so splitting on
/// newlines alone would hold them back until the end of the run.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' || b == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(b);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            let line = String::from_utf8_lossy(&self.pending).into_owned();
            self.pending.clear();
            Some(line)
        }
    }
}
