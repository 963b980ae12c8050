//! Shutting down background work.
//!
//! A ramp can run for a long time, so callers tend to spawn it. Before dropping the driver,
//! every outstanding task should be cancelled.

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::warn;

/// Tasks which failed, rather than being cancelled, while they were shut down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} task(s) failed during shutdown: {}", .0.len(), .0.join("; "))]
pub struct TaskFailures(pub Vec<String>);

/// Cancel every task, then wait for each of them.
///
/// All tasks are cancelled even if some fail. Tasks which had already finished are fine;
/// panics are collected into [`TaskFailures`].
pub async fn cancel_all<T>(handles: Vec<JoinHandle<T>>) -> Result<(), TaskFailures> {
    for handle in &handles {
        handle.abort();
    }

    let mut failures = Vec::new();
    for handle in handles {
        match handle.await {
            Ok(_) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                warn!("Task failed during shutdown: {e}");
                failures.push(e.to_string());
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(TaskFailures(failures))
    }
}
