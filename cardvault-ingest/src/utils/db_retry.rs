//! Retry policies for reconciliation write scopes
//!
//! Two independent policies:
//! - [`retry_on_lock`]: exponential backoff for SQLite writer contention
//!   ("database is locked"), bounded by `max_lock_wait_ms`.
//! - [`retry_on_conflict`]: exactly one retry after a fixed delay for
//!   duplicate-key races on shared dictionary rows.

use crate::error::{ImportError, ImportResult};
use std::future::Future;
use std::time::{Duration, Instant};

const FIRST_BACKOFF_MS: u64 = 10;
const MAX_BACKOFF_MS: u64 = 1000;
const SLOW_SCOPE_MS: u128 = 2000;

/// Re-run a write scope while SQLite reports writer contention
///
/// Backoff doubles from 10ms up to 1s between attempts. Once `max_wait_ms`
/// has passed the contention becomes [`ImportError::Internal`]. Any other
/// error is returned on the spot. `operation` owns its whole transaction, so
/// each attempt starts from a clean slate.
pub async fn retry_on_lock<F, Fut, T>(
    operation_name: &str,
    max_wait_ms: u64,
    mut operation: F,
) -> ImportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ImportResult<T>>,
{
    let started = Instant::now();
    let budget = Duration::from_millis(max_wait_ms);
    let mut backoff_ms = FIRST_BACKOFF_MS;
    let mut attempts = 0u32;

    loop {
        attempts += 1;

        let err = match operation().await {
            Ok(value) => {
                let waited_ms = started.elapsed().as_millis();
                if attempts > 1 && waited_ms > SLOW_SCOPE_MS {
                    tracing::warn!(
                        scope = operation_name,
                        attempts,
                        waited_ms,
                        "Write scope committed after long lock wait"
                    );
                } else if attempts > 1 {
                    tracing::debug!(
                        scope = operation_name,
                        attempts,
                        waited_ms,
                        "Write scope committed after lock wait"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_lock_contention() => err,
            Err(err) => return Err(err),
        };

        let waited = started.elapsed();
        if waited >= budget {
            tracing::error!(
                scope = operation_name,
                attempts,
                waited_ms = waited.as_millis(),
                max_wait_ms,
                error = %err,
                "Giving up on locked database"
            );
            return Err(ImportError::Internal(format!(
                "{}: database locked after {} attempts ({} ms elapsed, max {} ms)",
                operation_name,
                attempts,
                waited.as_millis(),
                max_wait_ms
            )));
        }

        tracing::debug!(
            scope = operation_name,
            attempts,
            backoff_ms,
            "Database locked, backing off"
        );
        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
        backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
    }
}

/// Run `operation`, retrying it exactly once after `delay` on a transient conflict
///
/// A second conflict is returned unchanged; callers treat it as fatal.
pub async fn retry_on_conflict<F, Fut, T>(
    operation_name: &str,
    delay: Duration,
    operation: F,
) -> ImportResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ImportResult<T>>,
{
    retry_once_if(operation_name, delay, ImportError::is_conflict, operation).await
}

/// Retry-once policy decoupled from the error type by `should_retry`
pub async fn retry_once_if<F, Fut, T, E, P>(
    operation_name: &str,
    delay: Duration,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    match operation().await {
        Err(err) if should_retry(&err) => {
            tracing::warn!(
                operation = operation_name,
                delay_ms = delay.as_millis(),
                error = %err,
                "Concurrent insert conflict, retrying once"
            );
            tokio::time::sleep(delay).await;
            operation().await
        }
        other => other,
    }
}
