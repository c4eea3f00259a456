//! DoneHandle - completion signal for a Dispatcher run

use tokio::sync::oneshot;
use tracing::debug;

/// One-shot completion signal returned by
/// [`Dispatcher::start`](super::Dispatcher::start)
///
/// Fires exactly once, after full shutdown: loop exit, channel closure, and
/// cancellation-token release have all completed.
#[derive(Debug)]
pub struct DoneHandle {
    rx: oneshot::Receiver<()>,
}

impl DoneHandle {
    pub(crate) fn new(rx: oneshot::Receiver<()>) -> Self {
        Self { rx }
    }

    /// Wait for the Dispatcher to finish shutting down
    pub async fn wait(self) {
        debug!("DoneHandle::wait: called");
        let _ = self.rx.await;
        debug!("DoneHandle::wait: dispatcher finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_resolves_on_signal() {
        let (tx, rx) = oneshot::channel();
        let handle = DoneHandle::new(rx);

        tx.send(()).unwrap();
        handle.wait().await;
    }

    #[tokio::test]
    async fn test_wait_resolves_on_dropped_sender() {
        let (tx, rx) = oneshot::channel::<()>();
        let handle = DoneHandle::new(rx);

        // A dropped sender must not hang the waiter
        drop(tx);
        handle.wait().await;
    }
}
