//! Bounded retry for optimistic multi-field writes.
//!
//! The single-statement transition path never retries; this wrapper
//! exists for the checklist save path, where read-modify-write over the
//! whole structure can lose a revision race.

use std::time::Duration;

use crate::application::error::WorkflowError;
use crate::application::repos::RepoError;

pub const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(100);

/// Run `operation` up to [`MAX_ATTEMPTS`] times, retrying only on write
/// conflicts with a linearly growing backoff (100 ms after the first
/// attempt, 200 ms after the second). Exhaustion maps to
/// [`WorkflowError::RetryExhausted`]; every other error passes through
/// immediately.
pub async fn with_write_conflict_retry<T, F, Fut>(mut operation: F) -> Result<T, WorkflowError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WorkflowError>>,
{
    for attempt in 1..=MAX_ATTEMPTS {
        match operation().await {
            Err(WorkflowError::Repo(RepoError::Conflict)) => {
                tracing::debug!(attempt, "write conflict, retrying");
                metrics::counter!("permiso_write_conflict_retries_total").increment(1);
                if attempt < MAX_ATTEMPTS {
                    tokio::time::sleep(BACKOFF_STEP * attempt).await;
                }
            }
            other => return other,
        }
    }
    Err(WorkflowError::RetryExhausted {
        attempts: MAX_ATTEMPTS,
    })
}
