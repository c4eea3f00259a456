//! Job and control-message types for the Dispatcher

use std::fmt;
use std::future::Future;

use eyre::Result;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// A single unit of work
///
/// Jobs receive the pool's cancellation token and are expected to observe it
/// cooperatively; the pool never interrupts a running job. A failure is
/// reported by the pool and discarded — it stops neither the loop nor any
/// queued jobs.
pub struct Job {
    f: Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<()>> + Send>,
}

impl Job {
    /// Wrap an async closure as a job
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            f: Box::new(move |cancel| Box::pin(f(cancel))),
        }
    }

    /// Execute the job, consuming it
    pub(crate) async fn run(self, cancel: CancellationToken) -> Result<()> {
        (self.f)(cancel).await
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Job")
    }
}

/// Internal requests to the execution loop
#[derive(Debug)]
pub(crate) enum DispatchRequest {
    /// Request shutdown; acked once the loop has flipped to Stopping
    Stop { ack: oneshot::Sender<()> },
}

/// Lifecycle state of a [`Dispatcher`](super::Dispatcher)
///
/// Published only by the execution loop; everyone else reads snapshots.
/// `Stopped` is terminal — a Dispatcher is never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    NotStarted,
    Running,
    Stopping,
    Stopped,
}
