//! Retry helper for idempotent reads
//!
//! Only operations that can be repeated without side effects go through
//! [`retry_with_backoff`]: block hash, access key and status lookups.
//! Submission itself is never retried here.

use std::future::Future;
use std::time::Instant;

use tokio::time::sleep;
use tracing::{debug, warn};

use super::nonce_errors::NonceError;
use crate::rpc_manager::{RetryPolicy, RpcError};

/// Errors that know whether repeating the operation may succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for RpcError {
    fn is_retryable(&self) -> bool {
        RpcError::is_retryable(self)
    }
}

impl Retryable for NonceError {
    fn is_retryable(&self) -> bool {
        self.is_transient()
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are used up. The last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start_time = Instant::now();
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0u32;

    loop {
        if attempt > 0 {
            debug!(
                operation = operation_name,
                attempt = attempt + 1,
                max_attempts,
                "Retrying operation"
            );
        }

        let err = match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(
                        operation = operation_name,
                        attempts = attempt + 1,
                        duration_ms = start_time.elapsed().as_millis() as u64,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => err,
        };

        if !err.is_retryable() {
            warn!(
                operation = operation_name,
                error = %err,
                "Permanent error, not retrying"
            );
            return Err(err);
        }

        if attempt + 1 >= max_attempts {
            warn!(
                operation = operation_name,
                attempts = attempt + 1,
                error = %err,
                "All retry attempts exhausted"
            );
            return Err(err);
        }

        let backoff = policy.calculate_delay(attempt).unwrap_or_default();
        debug!(
            operation = operation_name,
            attempt = attempt + 1,
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "Transient error, backing off before retry"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}
