//! A background task that runs a job once per tick until cancelled.

use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{TickConfig, TickInfo, TickScheduler};

/// Handle to a spawned periodic job.
///
/// The job runs on its own Tokio task, driven by a [`TickScheduler`].
/// [`shutdown`](Self::shutdown) asks it to stop and waits until it has.
/// Cancellation is observed at every await point, including inside a job
/// that is mid-run, so a stalled job cannot hold shutdown hostage.
///
/// Dropping the handle without calling `shutdown` aborts the task.
pub struct PeriodicTask {
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Spawns `job` to run on every tick of a scheduler built from
    /// `config`.
    ///
    /// The task is attached to the caller's current `tracing` span, so
    /// its log lines carry the same context as the code that started it.
    pub fn spawn<F, Fut>(config: TickConfig, mut job: F) -> Self
    where
        F: FnMut(TickInfo) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(
            async move {
                let mut scheduler = TickScheduler::new(config);
                loop {
                    tokio::select! {
                        biased;
                        // Fires on an explicit cancel and when the sender
                        // is dropped along with the handle.
                        _ = &mut cancel_rx => break,
                        _ = async {
                            let info = scheduler.wait_for_tick().await;
                            job(info).await;
                        } => {}
                    }
                }
                tracing::debug!(
                    ticks = scheduler.tick_count(),
                    "periodic task stopped"
                );
            }
            .in_current_span(),
        );

        Self {
            cancel: Some(cancel_tx),
            handle: Some(handle),
        }
    }

    /// Whether the task is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancels the task and waits for it to terminate.
    ///
    /// Safe to call multiple times (idempotent). Returns once the task
    /// has actually exited, not merely been signalled.
    pub async fn shutdown(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // The receiver is gone only if the task already exited.
            let _ = cancel.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::warn!(error = %e, "periodic task panicked");
                }
            }
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
