//! Fixed-delay retry for RPC calls
//!
//! Unlike exponential backoff, every failed attempt waits the same delay.
//! Exhausting the attempts is not an error: the caller gets `None` and
//! decides on a fallback.

use log::error;
use std::future::Future;

use crate::{config::RetryPolicy, errors::RpcError};

/// Run `operation` until it succeeds or the policy's attempts are used up
///
/// Every failure is logged with its attempt number. The delay is only
/// applied between attempts, never after the last one.
///
/// # Arguments
/// * `policy` - Attempt count and delay
/// * `label` - Operation name used in log messages
/// * `operation` - Produces a fresh future per attempt
///
/// # Returns
/// * `Some(T)` - Result of the first successful attempt
/// * `None` - Every attempt failed
pub async fn retry_fixed<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RpcError>>,
{
    let attempts = policy.max_attempts.max(1);
    for attempt in 1..=attempts {
        match operation().await {
            Ok(value) => return Some(value),
            Err(e) => {
                error!("{label} error: {e}, the {attempt} time");
                if attempt < attempts && !policy.delay().is_zero() {
                    tokio::time::sleep(policy.delay()).await;
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, time::Duration};

    fn failure() -> RpcError {
        RpcError::Transport {
            method: "eth_getBlockReceipts".to_string(),
            reason: "connection reset".to_string(),
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let result = retry_fixed(&policy, "test", || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move { if n < 3 { Err(failure()) } else { Ok(n) } }
        })
        .await;
        assert_eq!(result, Some(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(1));
        let result: Option<u32> = retry_fixed(&policy, "test", || {
            calls.set(calls.get() + 1);
            async { Err(failure()) }
        })
        .await;
        assert_eq!(result, None);
        assert_eq!(calls.get(), 5);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let result = retry_fixed(&policy, "test", || {
            calls.set(calls.get() + 1);
            async { Ok::<_, RpcError>(1) }
        })
        .await;
        assert_eq!(result, Some(1));
        assert_eq!(calls.get(), 1);
    }
}
