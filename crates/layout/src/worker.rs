#![forbid(unsafe_code)]

//! Background execution: one dedicated thread per computation, reporting
//! over a channel.
//!
//! The request and oracle handle are moved into the thread; the caller only
//! sees [`WorkerEvent`]s. Every job ends with exactly one terminal event
//! (`Completed` or `Failed`), after which the receiver is dropped and
//! nothing more is delivered.

use crate::compute::{CancelToken, ComputeState, ComputedLayout, LayoutRequest, compute_guarded};
use crate::error::ComputeError;
use crate::oracle::LayoutOracle;
use crate::progress::{Progress, ProgressSchedule};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const WORKER_THREAD_NAME: &str = "tl-layout-worker";

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(Progress),
    Completed(Box<ComputedLayout>),
    Failed(ComputeError),
}

impl WorkerEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerEvent::Progress(_))
    }
}

#[derive(Debug)]
pub struct BackgroundJob {
    events: Option<Receiver<WorkerEvent>>,
    handle: Option<JoinHandle<()>>,
    cancel: CancelToken,
    timeout: Option<Duration>,
    state: ComputeState,
    started: Instant,
}

impl BackgroundJob {
    pub fn spawn<O: LayoutOracle + 'static>(
        request: LayoutRequest,
        oracle: Arc<O>,
        schedule: ProgressSchedule,
        timeout: Option<Duration>,
    ) -> Result<Self, ComputeError> {
        let cancel = timeout.map_or_else(CancelToken::new, CancelToken::with_timeout);
        let worker_cancel = cancel.clone();
        let (tx, rx) = mpsc::channel();
        let nodes = request.node_count();
        let edges = request.edges.len();

        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let progress_tx = tx.clone();
                let mut sink = |progress: Progress| {
                    let _ = progress_tx.send(WorkerEvent::Progress(progress));
                };
                let terminal =
                    match compute_guarded(request, &*oracle, &schedule, &worker_cancel, &mut sink) {
                        Ok(layout) => WorkerEvent::Completed(Box::new(layout)),
                        Err(err) => WorkerEvent::Failed(err),
                    };
                // The receiver is gone after a timeout; late results are dropped.
                let _ = tx.send(terminal);
            })
            .map_err(|err| {
                warn!(error = %err, "failed to spawn layout worker");
                ComputeError::WorkerSpawn(err.to_string())
            })?;

        info!(nodes, edges, timeout_ms = ?timeout.map(|t| t.as_millis()), "layout worker started");
        Ok(Self {
            events: Some(rx),
            handle: Some(handle),
            cancel,
            timeout,
            state: ComputeState::Running,
            started: Instant::now(),
        })
    }

    pub fn state(&self) -> ComputeState {
        self.state
    }

    /// Asks the worker to stop at its next phase boundary. The job still
    /// ends with a terminal event.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Blocks for the next event, up to the deadline. Returns `None` once
    /// the terminal event has been delivered.
    pub fn next_event(&mut self) -> Option<WorkerEvent> {
        let events = self.events.as_ref()?;
        let received = match self.cancel.deadline() {
            Some(deadline) => {
                events.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        let event = match received {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => {
                self.cancel.cancel();
                let after_ms = self.timeout.map_or(0, |t| t.as_millis());
                warn!(after_ms, "layout worker timed out; detaching");
                let event = WorkerEvent::Failed(ComputeError::TimedOut { after_ms });
                self.finish(&event, false);
                return Some(event);
            }
            Err(RecvTimeoutError::Disconnected) => {
                WorkerEvent::Failed(ComputeError::WorkerDisconnected)
            }
        };
        if event.is_terminal() {
            self.finish(&event, true);
        }
        Some(event)
    }

    /// Drives the job to its terminal event, forwarding progress.
    pub fn wait(
        mut self,
        on_progress: &mut dyn FnMut(&Progress),
    ) -> Result<ComputedLayout, ComputeError> {
        while let Some(event) = self.next_event() {
            match event {
                WorkerEvent::Progress(progress) => on_progress(&progress),
                WorkerEvent::Completed(layout) => return Ok(*layout),
                WorkerEvent::Failed(err) => return Err(err),
            }
        }
        Err(ComputeError::WorkerDisconnected)
    }

    fn finish(&mut self, event: &WorkerEvent, join: bool) {
        self.state = match event {
            WorkerEvent::Completed(_) => ComputeState::Completed,
            _ => ComputeState::Failed,
        };
        self.events = None;
        let handle = self.handle.take();
        if join && let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("layout worker panicked after reporting");
            }
        }
        let elapsed_ms = self.started.elapsed().as_millis();
        match event {
            WorkerEvent::Failed(err) => {
                warn!(code = err.code(), error = %err, elapsed_ms, "layout worker failed")
            }
            _ => info!(elapsed_ms, "layout worker completed"),
        }
    }
}

impl Drop for BackgroundJob {
    fn drop(&mut self) {
        if !self.state.is_terminal() {
            debug!("layout worker abandoned before completion; cancelling");
            self.cancel.cancel();
        }
    }
}
