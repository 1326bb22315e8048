//! Tracker for fire-and-forget work.
//!
//! Detached writes (conversation reopen) and engage runs are spawned here
//! instead of bare `tokio::spawn`, so that errors are logged in one place
//! and shutdown can wait for in-flight work.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_util::task::TaskTracker;

#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `future` as a detached task. An `Err` is logged with `name`
    /// and dropped.
    pub fn spawn<F, E>(&self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.tracker.spawn(async move {
            if let Err(e) = future.await {
                tracing::error!(task = name, error = %e, "Background task failed");
            }
        });
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    /// Wait until every task spawned so far has finished. The tracker stays
    /// usable afterwards.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Stop accepting the notion of new work and wait up to `timeout` for
    /// in-flight tasks. Returns `false` if tasks were still running when
    /// the timeout elapsed; they are abandoned.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let drained = tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok();
        if drained {
            tracing::info!("Background tasks drained");
        } else {
            tracing::warn!(
                remaining = self.tracker.len(),
                "Background tasks still running at shutdown, abandoning"
            );
        }
        drained
    }
}
