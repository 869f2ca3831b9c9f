//! Deadline-guarded execution.
//!
//! [`wait_for`] races a unit of async work against a timer and yields exactly
//! one result: the work's own output, or whatever `on_timeout` produces.
//!
//! The timer lives inside the race future and is dropped with it, so it is
//! released on every exit path.
//!
//! Dropping the race drops `operation`. To keep the work running after a
//! timeout, start it first (`tokio::spawn`) and pass the join handle: dropping
//! a join handle detaches the task instead of cancelling it.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// The deadline passed before the operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Deadline of {0:?} elapsed")]
pub struct DeadlineElapsed(pub Duration);

/// Await `operation` for at most `timeout`.
///
/// The operation is polled before the timer, so an operation that is already
/// complete wins even against a zero timeout.
pub async fn race<F>(operation: F, timeout: Duration) -> Result<F::Output, DeadlineElapsed>
where
    F: Future,
{
    tokio::time::timeout(timeout, operation)
        .await
        .map_err(|_| DeadlineElapsed(timeout))
}

/// Await `operation`, falling back to `on_timeout` if `timeout` elapses first.
///
/// `on_timeout` is called at most once, and only after the timer has been
/// released. Its output, including any error it carries, is returned as-is.
/// Errors from `operation` are never transformed.
pub async fn wait_for<F, G, Fut>(operation: F, timeout: Duration, on_timeout: G) -> F::Output
where
    F: Future,
    G: FnOnce() -> Fut,
    Fut: Future<Output = F::Output>,
{
    match race(operation, timeout).await {
        Ok(output) => output,
        Err(elapsed) => {
            debug!(timeout_ms = %elapsed.0.as_millis(), "Deadline elapsed, running timeout handler");
            on_timeout().await
        }
    }
}
