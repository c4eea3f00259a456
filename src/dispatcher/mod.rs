//! Bounded single-dispatcher job pool
//!
//! The Dispatcher owns a fixed-capacity job queue and a single background
//! task that drains it, one job at a time:
//! - **submit:** enqueue jobs, blocking on a full queue (back-pressure)
//! - **stop:** request shutdown; completion is signaled via [`DoneHandle`]
//! - **idle timeout / cancellation:** the pool also stops itself

mod config;
mod core;
mod handle;
mod messages;

pub use config::DispatcherConfig;
pub use core::Dispatcher;
pub use handle::DoneHandle;
pub use messages::{DispatcherState, Job};
