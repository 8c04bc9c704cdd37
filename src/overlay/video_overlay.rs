use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::{
    command::OverlayCommand,
    config::Config,
    dispatch::MainHandle,
    engine::{MediaEngine, Session, SessionCallbacks, SessionHandle},
    error::{EngineError, OverlayError, Result},
    overlay::delegate::{OverlayDelegate, OverlayOutcome, UNKNOWN_ERROR_MESSAGE},
};

/// Color-washes two videos and overlays one on the other
///
/// The operation runs in three phases:
/// 1. Validation - both inputs must exist and the scratch directory must be usable
/// 2. Submission - the fixed overlay command is handed to the engine
/// 3. Notification - the engine's result is classified and relayed on the main context
///
/// Nothing guards two jobs writing the same output name at once; callers
/// that need that must pick distinct names.
pub struct VideoOverlay {
    engine: Arc<dyn MediaEngine>,
    main: MainHandle,
    delegate: Option<Arc<dyn OverlayDelegate>>,
    config: Config,
}

impl VideoOverlay {
    pub fn new(engine: Arc<dyn MediaEngine>, main: MainHandle) -> Self {
        Self {
            engine,
            main,
            delegate: None,
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn OverlayDelegate>) -> Self {
        self.delegate = Some(delegate);
        self
    }

    pub fn set_delegate(&mut self, delegate: Option<Arc<dyn OverlayDelegate>>) {
        self.delegate = delegate;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start the overlay of `video1` (background, red wash) and `video2`
    /// (overlay, cyan wash, half size, centered)
    ///
    /// The result is written to `<scratch dir>/<output_file_name>`. Input and
    /// directory problems are returned right away and nothing is submitted;
    /// everything after submission is reported through the delegate and the
    /// returned [`OverlayJob`].
    pub fn overlay_videos_with_color_wash<P: AsRef<Path>>(
        &self,
        video1: P,
        video2: P,
        output_file_name: &str,
    ) -> Result<OverlayJob> {
        let video1 = video1.as_ref();
        let video2 = video2.as_ref();

        check_input("Video 1", video1)?;
        check_input("Video 2", video2)?;

        let output_dir = self.config.scratch_dir();
        ensure_output_dir(&output_dir)?;
        let output_path = output_dir.join(output_file_name);

        let command = OverlayCommand::new(video1, video2, &output_path);
        let command_line = command.to_command_line();
        info!("Executing FFmpeg command: {}", command_line);

        let (tx, rx) = oneshot::channel();
        let callbacks = self.callbacks(output_path.clone(), tx);
        let session = self.engine.execute_async(&command_line, callbacks);
        debug!("Submitted overlay as session {}", session.session_id());

        Ok(OverlayJob {
            session,
            output_path,
            command_line,
            outcome: Some(rx),
        })
    }

    fn callbacks(
        &self,
        output_path: PathBuf,
        tx: oneshot::Sender<OverlayOutcome>,
    ) -> SessionCallbacks {
        let main = self.main.clone();
        let delegate = self.delegate.clone();
        let complete = Box::new(move |session: Session| {
            let outcome = classify_session(&session, &output_path);
            main.dispatch(move || {
                if let Some(delegate) = &delegate {
                    outcome.notify(&**delegate);
                }
                let _ = tx.send(outcome);
            });
        });

        let log_engine_output = self.config.engine.log_engine_output;
        let log = Box::new(move |line: crate::engine::LogLine| {
            if log_engine_output {
                debug!(session = line.session_id, "FFmpeg: {}", line.message);
            }
        });

        let main = self.main.clone();
        let delegate = self
            .delegate
            .clone()
            .filter(|_| self.config.output.forward_progress);
        let statistics = Box::new(move |stats: crate::engine::Statistics| {
            if let Some(delegate) = &delegate {
                let delegate = delegate.clone();
                let duration_ms = stats.duration_ms.unwrap_or(0);
                main.dispatch(move || delegate.did_update_progress(stats.time_ms, duration_ms));
            }
        });

        SessionCallbacks {
            complete,
            log,
            statistics,
        }
    }
}

fn check_input(label: &str, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    if !path.exists() {
        return Err(OverlayError::InputNotFound {
            label: label.to_string(),
            name,
        });
    }

    if path.is_file() && File::open(path).is_err() {
        return Err(OverlayError::InputUnreadable {
            label: label.to_string(),
            name,
        });
    }

    Ok(())
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        return Ok(());
    }

    debug!("Creating output directory {:?}", dir);
    std::fs::create_dir_all(dir).map_err(|e| OverlayError::OutputDirectoryCreation {
        path: dir.display().to_string(),
        reason: e.to_string(),
    })
}

/// Turn a finished session into the outcome the delegate sees
pub fn classify_session(session: &Session, output_path: &Path) -> OverlayOutcome {
    match session.return_code() {
        Some(code) if code.is_success() => {
            info!("FFmpeg command executed successfully. Output: {}", output_path.display());
            OverlayOutcome::Succeeded {
                output_path: output_path.to_path_buf(),
            }
        }
        Some(code) if code.is_cancel() => {
            info!("FFmpeg command cancelled.");
            OverlayOutcome::Cancelled
        }
        code => {
            let diagnostic = session
                .fail_stack_trace()
                .or_else(|| session.output())
                .unwrap_or(UNKNOWN_ERROR_MESSAGE);
            error!(
                "FFmpeg command failed with state {} and return code {}. Error: {}",
                session.state(),
                code.map(|c| c.value()).unwrap_or(-1),
                diagnostic
            );
            OverlayOutcome::Failed {
                message: EngineError::Failed {
                    message: diagnostic.to_string(),
                }
                .to_string(),
            }
        }
    }
}

/// A submitted overlay
pub struct OverlayJob {
    session: SessionHandle,
    output_path: PathBuf,
    command_line: String,
    outcome: Option<oneshot::Receiver<OverlayOutcome>>,
}

impl OverlayJob {
    /// Engine handle for the running session
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Outcome, if the main context has already delivered it
    ///
    /// Returns `Some` at most once.
    pub fn try_outcome(&mut self) -> Option<OverlayOutcome> {
        let outcome = self.outcome.as_mut()?.try_recv().ok()?;
        self.outcome = None;
        Some(outcome)
    }

    /// Wait for the outcome
    ///
    /// It resolves only once the main loop has run the notification, so the
    /// loop must be driven while waiting (see [`MainLoop::run_until`](crate::dispatch::MainLoop::run_until)).
    pub async fn wait(self) -> Result<OverlayOutcome> {
        let outcome = self.outcome.ok_or(EngineError::ChannelClosed)?;
        outcome.await.map_err(|_| EngineError::ChannelClosed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MainQueue;
    use crate::engine::{next_session_id, LogLine, ReturnCode, SessionHandle, Statistics};
    use crate::overlay::delegate::CANCELLED_MESSAGE;
    use std::sync::Mutex;
    use std::thread::{self, ThreadId};
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Notify;

    /// How the mock engine finishes each session
    #[derive(Clone)]
    enum Finish {
        Exit { code: i32, output: Option<&'static str> },
        SpawnFailure(&'static str),
    }

    /// Engine that completes every session on a separate thread
    struct MockEngine {
        finish: Finish,
        progress: Vec<i64>,
        submitted: Mutex<Vec<String>>,
    }

    impl MockEngine {
        fn new(finish: Finish) -> Self {
            Self {
                finish,
                progress: Vec::new(),
                submitted: Mutex::new(Vec::new()),
            }
        }

        fn submissions(&self) -> usize {
            self.submitted.lock().unwrap().len()
        }
    }

    impl MediaEngine for MockEngine {
        fn execute_async(&self, command: &str, callbacks: SessionCallbacks) -> SessionHandle {
            self.submitted.lock().unwrap().push(command.to_string());
            let mut session = Session::new(next_session_id(), command);
            let handle = SessionHandle::new(session.id(), Arc::new(Notify::new()));
            let finish = self.finish.clone();
            let progress = self.progress.clone();

            thread::spawn(move || {
                session.start();
                for time_ms in progress {
                    (callbacks.statistics)(Statistics {
                        session_id: session.id(),
                        time_ms,
                        duration_ms: Some(10_000),
                        ..Statistics::default()
                    });
                }
                match finish {
                    Finish::Exit { code, output } => {
                        if let Some(text) = output {
                            session.append_output(text);
                        }
                        session.complete(ReturnCode::new(code));
                    }
                    Finish::SpawnFailure(trace) => session.fail(trace),
                }
                (callbacks.complete)(session);
            });

            handle
        }
    }

    #[derive(Default)]
    struct RecordingDelegate {
        successes: Mutex<Vec<(PathBuf, ThreadId)>>,
        failures: Mutex<Vec<(String, ThreadId)>>,
        progress: Mutex<Vec<(i64, i64)>>,
    }

    impl OverlayDelegate for RecordingDelegate {
        fn did_succeed(&self, output_path: &Path) {
            self.successes
                .lock()
                .unwrap()
                .push((output_path.to_path_buf(), thread::current().id()));
        }

        fn did_fail(&self, error_message: &str) {
            self.failures
                .lock()
                .unwrap()
                .push((error_message.to_string(), thread::current().id()));
        }

        fn did_update_progress(&self, time_ms: i64, duration_ms: i64) {
            self.progress.lock().unwrap().push((time_ms, duration_ms));
        }
    }

    struct Fixture {
        _dir: TempDir,
        video1: PathBuf,
        video2: PathBuf,
        scratch: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let video1 = dir.path().join("background.mp4");
        let video2 = dir.path().join("overlay.mp4");
        std::fs::write(&video1, b"bg").unwrap();
        std::fs::write(&video2, b"ov").unwrap();
        let scratch = dir.path().join("scratch");
        Fixture {
            _dir: dir,
            video1,
            video2,
            scratch,
        }
    }

    fn config_for(fixture: &Fixture) -> Config {
        let mut config = Config::default();
        config.output.scratch_dir = Some(fixture.scratch.clone());
        config
    }

    /// Run one overlay against `engine` and drive the main loop until it resolves
    fn run_overlay(
        engine: Arc<MockEngine>,
        delegate: Arc<RecordingDelegate>,
        fixture: &Fixture,
    ) -> OverlayOutcome {
        let (main, mut main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine, main)
            .with_config(config_for(fixture))
            .with_delegate(delegate);

        let mut job = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .unwrap();

        loop {
            main_loop.next_blocking();
            if let Some(outcome) = job.try_outcome() {
                main_loop.run_pending();
                return outcome;
            }
        }
    }

    #[test]
    fn test_missing_input_fails_before_submission() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, _main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine.clone(), main).with_config(config_for(&fixture));

        let missing = fixture.video1.with_file_name("nope.mp4");
        let err = overlay
            .overlay_videos_with_color_wash(&missing, &fixture.video2, "out.mp4")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Video 1 file not found: nope.mp4");

        let err = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &missing, "out.mp4")
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Video 2 file not found: nope.mp4");

        assert_eq!(engine.submissions(), 0);
    }

    #[test]
    fn test_directory_failure_short_circuits() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, _main_loop) = MainQueue::new();

        // A directory can never be created beneath a regular file
        let mut config = Config::default();
        config.output.scratch_dir = Some(fixture.video1.join("scratch"));
        let overlay = VideoOverlay::new(engine.clone(), main).with_config(config);

        let err = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .err()
            .unwrap();
        assert!(matches!(err, OverlayError::OutputDirectoryCreation { .. }));
        assert_eq!(engine.submissions(), 0);
    }

    #[test]
    fn test_scratch_directory_is_created() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, _main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine.clone(), main).with_config(config_for(&fixture));

        let job = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .unwrap();

        assert!(fixture.scratch.is_dir());
        assert_eq!(job.output_path(), fixture.scratch.join("out.mp4"));
        assert_eq!(engine.submitted.lock().unwrap()[0], job.command_line());
    }

    #[test]
    fn test_command_targets_scratch_output() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, _main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine, main).with_config(config_for(&fixture));

        let job = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .unwrap();
        let line = job.command_line();
        let output = fixture.scratch.join("out.mp4");

        assert_eq!(line.matches(fixture.video1.to_str().unwrap()).count(), 1);
        assert_eq!(line.matches(fixture.video2.to_str().unwrap()).count(), 1);
        for label in ["[v0_red]", "[v1_cyan_scaled]", "[v_out]"] {
            assert!(line.contains(label), "missing {}", label);
        }
        assert!(line.ends_with(&format!("\"{}\"", output.display())));
    }

    #[test]
    fn test_success_notifies_once_on_main_thread() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let delegate = Arc::new(RecordingDelegate::default());

        let outcome = run_overlay(engine, delegate.clone(), &fixture);

        let expected = fixture.scratch.join("out.mp4");
        assert_eq!(outcome.output_path(), Some(expected.as_path()));
        let successes = delegate.successes.lock().unwrap();
        assert_eq!(successes.len(), 1);
        assert_eq!(successes[0].0, expected);
        assert_eq!(successes[0].1, thread::current().id());
        assert!(delegate.failures.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_is_reported_distinctly() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 255, output: Some("Exiting normally, received signal 2.") }));
        let delegate = Arc::new(RecordingDelegate::default());

        let outcome = run_overlay(engine, delegate.clone(), &fixture);

        assert_eq!(outcome, OverlayOutcome::Cancelled);
        let failures = delegate.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, CANCELLED_MESSAGE);
        assert_eq!(failures[0].1, thread::current().id());
        assert!(delegate.successes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_without_diagnostics_uses_fallback() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 1, output: None }));
        let delegate = Arc::new(RecordingDelegate::default());

        run_overlay(engine, delegate.clone(), &fixture);

        let failures = delegate.failures.lock().unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "FFmpeg failed: Unknown FFmpeg error.");
    }

    #[test]
    fn test_failure_prefers_stack_trace_over_output() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::SpawnFailure("No such file or directory")));
        let delegate = Arc::new(RecordingDelegate::default());

        let outcome = run_overlay(engine, delegate.clone(), &fixture);
        assert_eq!(
            outcome.failure_message(),
            Some("FFmpeg failed: No such file or directory")
        );

        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 1, output: Some("Invalid data found when processing input") }));
        let outcome = run_overlay(engine, Arc::new(RecordingDelegate::default()), &fixture);
        assert_eq!(
            outcome.failure_message(),
            Some("FFmpeg failed: Invalid data found when processing input\n")
        );
    }

    #[test]
    fn test_progress_is_forwarded_before_completion() {
        let fixture = fixture();
        let mut engine = MockEngine::new(Finish::Exit { code: 0, output: None });
        engine.progress = vec![2_500, 5_000];
        let delegate = Arc::new(RecordingDelegate::default());

        run_overlay(Arc::new(engine), delegate.clone(), &fixture);

        assert_eq!(
            *delegate.progress.lock().unwrap(),
            vec![(2_500, 10_000), (5_000, 10_000)]
        );
    }

    #[test]
    fn test_progress_can_be_disabled() {
        let fixture = fixture();
        let mut engine = MockEngine::new(Finish::Exit { code: 0, output: None });
        engine.progress = vec![1_000];
        let delegate = Arc::new(RecordingDelegate::default());

        let (main, mut main_loop) = MainQueue::new();
        let mut config = config_for(&fixture);
        config.output.forward_progress = false;
        let overlay = VideoOverlay::new(Arc::new(engine), main)
            .with_config(config)
            .with_delegate(delegate.clone());
        let mut job = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .unwrap();

        while job.try_outcome().is_none() {
            main_loop.next_blocking();
        }
        assert!(delegate.progress.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_job_resolves_without_delegate() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, mut main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine, main).with_config(config_for(&fixture));

        let job = overlay
            .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, "out.mp4")
            .unwrap();
        let outcome = main_loop.run_until(job.wait()).await.unwrap();
        assert!(outcome.is_success());
    }

    #[test]
    fn test_outcome_delivered_exactly_once_across_jobs() {
        let fixture = fixture();
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let delegate = Arc::new(RecordingDelegate::default());
        let (main, mut main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine, main)
            .with_config(config_for(&fixture))
            .with_delegate(delegate.clone());

        let mut jobs: Vec<OverlayJob> = ["a.mp4", "b.mp4"]
            .iter()
            .map(|name| {
                overlay
                    .overlay_videos_with_color_wash(&fixture.video1, &fixture.video2, name)
                    .unwrap()
            })
            .collect();

        let mut resolved = 0;
        while resolved < jobs.len() {
            main_loop.next_blocking();
            resolved += jobs.iter_mut().filter_map(|job| job.try_outcome()).count();
        }
        main_loop.run_pending();

        assert_eq!(delegate.successes.lock().unwrap().len(), 2);
        assert!(jobs.iter_mut().all(|job| job.try_outcome().is_none()));
    }

    /// Shared buffer the fmt subscriber writes into
    #[derive(Clone)]
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Feed one engine line through the log callback and return what DEBUG logging printed
    fn logged_engine_output(log_engine_output: bool) -> String {
        let fixture = fixture();
        let mut config = config_for(&fixture);
        config.engine.log_engine_output = log_engine_output;
        let engine = Arc::new(MockEngine::new(Finish::Exit { code: 0, output: None }));
        let (main, _main_loop) = MainQueue::new();
        let overlay = VideoOverlay::new(engine, main).with_config(config);
        let (tx, _rx) = oneshot::channel();
        let callbacks = overlay.callbacks(fixture.scratch.join("out.mp4"), tx);

        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || CapturedWriter(sink.clone()))
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            (callbacks.log)(LogLine {
                session_id: 7,
                message: "frame=   10 fps=25".to_string(),
            });
        });

        let bytes = captured.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_engine_output_logged_at_debug() {
        let logged = logged_engine_output(true);
        assert!(logged.contains("DEBUG"));
        assert!(logged.contains("FFmpeg: frame=   10 fps=25"));
        assert!(logged.contains("session=7"));
    }

    #[test]
    fn test_engine_output_logging_can_be_disabled() {
        assert_eq!(logged_engine_output(false), "");
    }
}
