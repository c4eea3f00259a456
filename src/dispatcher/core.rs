//! Dispatcher implementation

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::DispatcherConfig;
use super::handle::DoneHandle;
use super::messages::{DispatchRequest, DispatcherState, Job};

/// Receiver bundle owned by the execution loop
///
/// Taken out of the Dispatcher exactly once, by whichever `start` call wins;
/// that take is the linearization point for the at-most-one-loop invariant.
/// The loop is the sole reader and the sole closer of both receivers, and the
/// sole writer of the state watch.
struct LoopParts {
    job_rx: mpsc::Receiver<Job>,
    ctrl_rx: mpsc::Receiver<DispatchRequest>,
    state_tx: watch::Sender<DispatcherState>,
}

/// Why the execution loop exited
#[derive(Debug)]
enum StopCause {
    /// Explicit stop request
    Requested,
    /// Idle timeout elapsed with no event
    Idle,
    /// External cancellation token fired
    Cancelled,
    /// Dispatcher dropped while the loop was still running
    Detached,
}

/// The Dispatcher owns the job queue and the single background execution
/// loop that drains it, one job at a time.
///
/// All operations may be called from arbitrary tasks; they talk to the loop
/// exclusively through channels. Lifecycle misuse (submit before start,
/// double start, double stop) is advisory: logged and skipped, never fatal.
pub struct Dispatcher {
    queue_capacity: usize,
    idle_timeout: Duration,
    cancel: CancellationToken,
    job_tx: mpsc::Sender<Job>,
    ctrl_tx: mpsc::Sender<DispatchRequest>,
    state_rx: watch::Receiver<DispatcherState>,
    parts: Mutex<Option<LoopParts>>,
}

impl Dispatcher {
    /// Create a new Dispatcher from a configuration
    ///
    /// Only the (normalized) configuration values are copied in; the config
    /// value itself is not retained. The loop's cancellation token is a child
    /// of the configured one, so the pool can release its own token without
    /// cancelling the caller's.
    pub fn new(config: DispatcherConfig) -> Self {
        debug!(?config, "Dispatcher::new: called");
        let config = config.normalized();

        let cancel = match &config.cancellation {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };

        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
        let (ctrl_tx, ctrl_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(DispatcherState::NotStarted);

        Self {
            queue_capacity: config.queue_capacity,
            idle_timeout: config.idle_timeout(),
            cancel,
            job_tx,
            ctrl_tx,
            state_rx,
            parts: Mutex::new(Some(LoopParts {
                job_rx,
                ctrl_rx,
                state_tx,
            })),
        }
    }

    /// Begin processing jobs
    ///
    /// Spawns the execution loop and returns a [`DoneHandle`] that fires once
    /// full shutdown has completed. Returns `None` if the Dispatcher was
    /// already started (or already stopped) — the second caller gets nothing
    /// usable.
    ///
    /// The loop's first action after spawn is publishing `Running`, so the
    /// state is not officially `Running` the instant `start` returns; submit
    /// and stop wait for that acknowledgment internally.
    pub fn start(&self) -> Option<DoneHandle> {
        debug!("Dispatcher::start: called");
        let parts = self
            .parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(parts) = parts else {
            if self.state() == DispatcherState::Stopped {
                warn!("dispatcher already stopped");
            } else {
                warn!("dispatcher already started");
            }
            return None;
        };

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(run_loop(parts, self.cancel.clone(), self.idle_timeout, done_tx));

        Some(DoneHandle::new(done_rx))
    }

    /// Enqueue jobs in call order
    ///
    /// Blocks (awaits) while the queue is full. Rejected with an advisory
    /// when the Dispatcher is not running; rejection drops the jobs. Jobs
    /// from one caller keep their relative order; no ordering is guaranteed
    /// across concurrent callers.
    pub async fn submit(&self, jobs: impl IntoIterator<Item = Job>) {
        debug!("Dispatcher::submit: called");
        if !self.await_running().await {
            warn!("dispatcher not running, jobs rejected");
            return;
        }

        for job in jobs {
            if self.job_tx.send(job).await.is_err() {
                warn!("dispatcher stopped, job rejected");
                return;
            }
        }
        debug!("Dispatcher::submit: jobs enqueued");
    }

    /// Request shutdown
    ///
    /// No-op with an advisory when the Dispatcher is not running. Returns as
    /// soon as the request is enqueued — it never waits on an in-flight job.
    /// The loop acknowledges by flipping to `Stopping`; full teardown is
    /// observed through the [`DoneHandle`], not here.
    pub async fn stop(&self) {
        debug!("Dispatcher::stop: called");
        if !self.await_running().await {
            warn!("dispatcher not running");
            return;
        }

        let (ack_tx, ack_rx) = oneshot::channel();
        if self
            .ctrl_tx
            .try_send(DispatchRequest::Stop { ack: ack_tx })
            .is_err()
        {
            // Control channel full or closed: a stop is already in flight
            debug!("Dispatcher::stop: stop already requested");
            return;
        }

        // Finalizer task consumes the ack off the caller's back
        tokio::spawn(async move {
            let _ = ack_rx.await;
            debug!("Dispatcher::stop: acknowledged");
        });
        debug!("Dispatcher::stop: requested");
    }

    /// Snapshot of the current lifecycle state
    pub fn state(&self) -> DispatcherState {
        *self.state_rx.borrow()
    }

    /// The configured queue capacity
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Resolve the lifecycle state, waiting out a start acknowledgment
    ///
    /// `NotStarted` is ambiguous while a start is in flight: the loop may not
    /// have published `Running` yet. If start was called, wait on the watch
    /// until the loop speaks; otherwise report not-running immediately.
    async fn await_running(&self) -> bool {
        if self.state() == DispatcherState::NotStarted && !self.started() {
            return false;
        }

        let mut state_rx = self.state_rx.clone();
        match state_rx.wait_for(|s| *s != DispatcherState::NotStarted).await {
            Ok(state) => *state == DispatcherState::Running,
            Err(_) => false,
        }
    }

    /// Whether `start` has claimed the loop
    fn started(&self) -> bool {
        self.parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// The execution loop: a single task servicing one event at a time
///
/// Four event sources: the job queue, the control channel, the idle timer,
/// and the cancellation token. The idle sleep is re-created on every
/// iteration, so it measures consecutive idleness and re-arms after each
/// serviced event (a long job is never pre-empted by it). Idle and
/// cancellation shutdowns break out directly rather than sending into the
/// control channel this loop is the sole reader of.
async fn run_loop(
    mut parts: LoopParts,
    cancel: CancellationToken,
    idle_timeout: Duration,
    done_tx: oneshot::Sender<()>,
) {
    // First action: acknowledge the start. Readiness is published by the
    // loop itself, so all reads of "is running" are linearized with job and
    // stop handling.
    parts.state_tx.send_replace(DispatcherState::Running);
    info!(?idle_timeout, "dispatcher started");

    let cause = loop {
        tokio::select! {
            maybe_job = parts.job_rx.recv() => match maybe_job {
                Some(job) => {
                    debug!("run_loop: job received");
                    if let Err(e) = job.run(cancel.clone()).await {
                        warn!(error = %e, "job failed");
                    }
                }
                None => break StopCause::Detached,
            },

            Some(req) = parts.ctrl_rx.recv() => match req {
                DispatchRequest::Stop { ack } => {
                    parts.state_tx.send_replace(DispatcherState::Stopping);
                    let _ = ack.send(());
                    break StopCause::Requested;
                }
            },

            _ = cancel.cancelled() => break StopCause::Cancelled,

            _ = tokio::time::sleep(idle_timeout) => break StopCause::Idle,
        }
    };

    info!(?cause, "dispatcher stopping");
    parts.state_tx.send_replace(DispatcherState::Stopping);

    // Finalize: the loop has taken its last read, so it closes both channels
    // itself, releases the token, and only then signals completion.
    drop(parts.job_rx);
    drop(parts.ctrl_rx);
    cancel.cancel();
    parts.state_tx.send_replace(DispatcherState::Stopped);
    let _ = done_tx.send(());
    info!("dispatcher stopped");
}
