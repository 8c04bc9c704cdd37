//! # Main Context Dispatch
//!
//! Engine callbacks arrive on arbitrary threads. Observers that must run on
//! one designated context (the "main" thread of the host) receive their
//! notifications through a [`MainQueue`]: any thread posts tasks through a
//! [`MainHandle`], and the thread that owns the [`MainLoop`] runs them in
//! the order they were posted.

use std::future::Future;

use tokio::sync::mpsc;
use tracing::trace;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Constructor for a connected handle/loop pair
pub struct MainQueue;

impl MainQueue {
    pub fn new() -> (MainHandle, MainLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (MainHandle { tx }, MainLoop { rx })
    }
}

/// Posting side, cheap to clone and send across threads
#[derive(Clone)]
pub struct MainHandle {
    tx: mpsc::UnboundedSender<Task>,
}

impl MainHandle {
    /// Queue `task` to run on the main context
    ///
    /// Returns `false` when the loop has been dropped and the task discarded.
    pub fn dispatch<F>(&self, task: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx.send(Box::new(task)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side, driven by the thread that plays the main context
pub struct MainLoop {
    rx: mpsc::UnboundedReceiver<Task>,
}

impl MainLoop {
    /// Run every task already queued, without waiting; returns how many ran
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            ran += 1;
        }
        if ran > 0 {
            trace!("Main loop ran {} pending tasks", ran);
        }
        ran
    }

    /// Wait for and run the next task; `false` once every handle is gone
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking variant of [`MainLoop::next`] for threads outside a runtime
    pub fn next_blocking(&mut self) -> bool {
        match self.rx.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until every handle has been dropped
    pub async fn run(&mut self) {
        while self.next().await {}
    }

    /// Run tasks while `fut` is pending, then drain whatever is still queued
    ///
    /// Tasks are executed on the calling task, never on the future's side.
    pub async fn run_until<F: Future>(&mut self, fut: F) -> F::Output {
        tokio::pin!(fut);
        let output = loop {
            tokio::select! {
                biased;
                output = &mut fut => break output,
                task = self.rx.recv() => match task {
                    Some(task) => task(),
                    None => break (&mut fut).await,
                },
            }
        };
        self.run_pending();
        output
    }
}
