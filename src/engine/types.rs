use std::fmt;

use chrono::{DateTime, Local};

/// Exit classification reported for a finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnCode(i32);

impl ReturnCode {
    pub const SUCCESS: ReturnCode = ReturnCode(0);
    /// FFmpeg exits with 255 when it is interrupted
    pub const CANCEL: ReturnCode = ReturnCode(255);

    pub const fn new(value: i32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    pub fn is_cancel(&self) -> bool {
        *self == Self::CANCEL
    }

    pub fn is_error(&self) -> bool {
        !self.is_success() && !self.is_cancel()
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Running,
    /// The engine could not run the command at all
    Failed,
    /// The command ran to an exit status, whatever it was
    Completed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Record of one command execution, handed to the completion callback
#[derive(Debug, Clone)]
pub struct Session {
    id: u64,
    command: String,
    state: SessionState,
    return_code: Option<ReturnCode>,
    fail_stack_trace: Option<String>,
    output: String,
    start_time: Option<DateTime<Local>>,
    end_time: Option<DateTime<Local>>,
}

impl Session {
    pub fn new(id: u64, command: impl Into<String>) -> Self {
        Self {
            id,
            command: command.into(),
            state: SessionState::Created,
            return_code: None,
            fail_stack_trace: None,
            output: String::new(),
            start_time: None,
            end_time: None,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn return_code(&self) -> Option<ReturnCode> {
        self.return_code
    }

    /// Error text from the engine itself, if it failed to run the command
    pub fn fail_stack_trace(&self) -> Option<&str> {
        non_blank(self.fail_stack_trace.as_deref())
    }

    /// Everything the command printed, if anything
    pub fn output(&self) -> Option<&str> {
        non_blank(Some(self.output.as_str()))
    }

    pub fn start_time(&self) -> Option<DateTime<Local>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Local>> {
        self.end_time
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.end_time? - self.start_time?)
    }

    pub fn start(&mut self) {
        self.state = SessionState::Running;
        self.start_time = Some(Local::now());
    }

    pub fn append_output(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }

    pub fn complete(&mut self, return_code: ReturnCode) {
        self.state = SessionState::Completed;
        self.return_code = Some(return_code);
        self.end_time = Some(Local::now());
    }

    pub fn fail(&mut self, trace: impl Into<String>) {
        self.state = SessionState::Failed;
        self.fail_stack_trace = Some(trace.into());
        self.end_time = Some(Local::now());
    }
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// A single line printed by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub session_id: u64,
    pub message: String,
}

/// Encoding progress reported by the engine
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub session_id: u64,
    pub frame: u64,
    pub fps: f64,
    /// Position in the output, in milliseconds
    pub time_ms: i64,
    pub size_bytes: u64,
    pub bitrate_kbps: f64,
    pub speed: f64,
    /// Duration of the first input, when the engine reported one
    pub duration_ms: Option<i64>,
}
