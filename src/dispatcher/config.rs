//! Dispatcher configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Dispatcher configuration
///
/// Assembled with the `with_*` setters before construction and passed to
/// [`Dispatcher::new`](super::Dispatcher::new) once; only its values are
/// copied into the Dispatcher. Invalid values (zero capacity, zero timeout)
/// are silently normalized to the defaults during construction, never
/// rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Max pending jobs in the queue; submission beyond this blocks
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Consecutive idle time in milliseconds before the pool self-stops
    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Optional parent cancellation token; the pool stops when it fires
    #[serde(skip)]
    pub cancellation: Option<CancellationToken>,
}

fn default_queue_capacity() -> usize {
    debug!("default_queue_capacity: called");
    4
}

fn default_idle_timeout_ms() -> u64 {
    debug!("default_idle_timeout_ms: called");
    60_000
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        debug!("DispatcherConfig::default: called");
        Self {
            queue_capacity: 4,
            idle_timeout_ms: 60_000,
            cancellation: None,
        }
    }
}

impl DispatcherConfig {
    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the idle timeout, saturating beyond `u64::MAX` milliseconds
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Attach an external cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Get the idle timeout as a Duration
    pub fn idle_timeout(&self) -> Duration {
        debug!(idle_timeout_ms = %self.idle_timeout_ms, "DispatcherConfig::idle_timeout: called");
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Replace out-of-range values with the defaults
    pub(crate) fn normalized(mut self) -> Self {
        if self.queue_capacity == 0 {
            self.queue_capacity = default_queue_capacity();
        }
        if self.idle_timeout_ms == 0 {
            self.idle_timeout_ms = default_idle_timeout_ms();
        }
        self
    }
}
