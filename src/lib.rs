//! jobpool - Bounded single-dispatcher job-execution pool
//!
//! Callers submit units of work into a fixed-capacity queue; a background
//! dispatcher task consumes and runs them sequentially, stopping itself after
//! a configurable idle period or on external cancellation, and signaling
//! completion through a one-shot handle.
//!
//! # Core Concepts
//!
//! - **One loop, no locks**: a single task services jobs, stop requests, the
//!   idle timer, and cancellation one event at a time; lifecycle state is
//!   owned by that loop and published as snapshots
//! - **Back-pressure over failure**: a full queue blocks the submitter;
//!   nothing is dropped and there is no queue-full error path
//! - **Advisory misuse**: out-of-order lifecycle calls are logged and
//!   skipped, never fatal
//! - **Failures stay local**: a failing job is reported and discarded; it
//!   stops neither the loop nor any queued jobs
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use jobpool::{Dispatcher, DispatcherConfig, Job};
//!
//! # async fn example() {
//! let pool = Dispatcher::new(
//!     DispatcherConfig::default()
//!         .with_queue_capacity(2)
//!         .with_idle_timeout(Duration::from_secs(3)),
//! );
//!
//! let done = pool.start().expect("first start");
//! pool.submit([Job::new(|_cancel| async { Ok(()) })]).await;
//! pool.stop().await;
//! done.wait().await;
//! # }
//! ```

pub mod dispatcher;

// Re-export the public surface
pub use dispatcher::{Dispatcher, DispatcherConfig, DispatcherState, DoneHandle, Job};
