//! Fixed-interval scheduling for the session refresh loop.
//!
//! Two layers:
//!
//! - [`TickScheduler`]: a `sleep_until`-based timer that fires every
//!   `interval` and restarts the cadence from now after an overrun.
//! - [`PeriodicTask`]: spawns a job on its own Tokio task, runs it on
//!   every tick, and supports cancel-and-await shutdown.
//!
//! # Integration
//!
//! ```ignore
//! let mut task = PeriodicTask::spawn(TickConfig::every(interval), move |_tick| {
//!     let manager = Arc::clone(&manager);
//!     async move {
//!         if let Err(e) = manager.refresh().await {
//!             tracing::warn!(error = %e, "refresh failed");
//!         }
//!     }
//! });
//! // ...
//! task.shutdown().await;
//! ```

mod scheduler;
mod task;

pub use scheduler::{TickConfig, TickInfo, TickScheduler};
pub use task::PeriodicTask;
