//! Bounded retry with exponential backoff for provider lookups.
//! See ARCHITECTURE.md §3.2.
//!
//! Only transport faults and throttling are retried; throttling backs
//! off on a longer schedule. The per-provider timeout wraps the whole
//! loop, so a slow provider is cut off regardless of how many attempts
//! remain.

use std::future::Future;
use std::time::Duration;

use dyemind_common::error::{FailureKind, ProviderError};
use tracing::debug;

const TRANSPORT_BACKOFF_BASE: Duration = Duration::from_millis(500);
const TRANSPORT_BACKOFF_CAP: Duration = Duration::from_secs(4);
const RATE_LIMIT_BACKOFF_BASE: Duration = Duration::from_secs(2);
const RATE_LIMIT_BACKOFF_CAP: Duration = Duration::from_secs(8);

/// Run `lookup` until it succeeds, fails terminally, or exhausts
/// `max_retries` additional attempts.
pub async fn with_retries<T, F, Fut>(
    provider: &str,
    max_retries: u32,
    mut lookup: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        match lookup().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_retries && err.kind.is_retryable() => {
                let delay = backoff_delay(err.kind, attempt);
                debug!(
                    provider,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying provider lookup"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn backoff_delay(kind: FailureKind, attempt: u32) -> Duration {
    let (base, cap) = match kind {
        FailureKind::RateLimited => (RATE_LIMIT_BACKOFF_BASE, RATE_LIMIT_BACKOFF_CAP),
        _ => (TRANSPORT_BACKOFF_BASE, TRANSPORT_BACKOFF_CAP),
    };
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor).min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_transport_backoff_doubles_and_caps() {
        assert_eq!(
            backoff_delay(FailureKind::Transport, 0),
            Duration::from_millis(500)
        );
        assert_eq!(
            backoff_delay(FailureKind::Transport, 1),
            Duration::from_millis(1000)
        );
        assert_eq!(
            backoff_delay(FailureKind::Transport, 2),
            Duration::from_millis(2000)
        );
        assert_eq!(
            backoff_delay(FailureKind::Transport, 10),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn test_rate_limit_backoff_is_longer() {
        assert!(
            backoff_delay(FailureKind::RateLimited, 0)
                > backoff_delay(FailureKind::Transport, 0)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 5),
            Duration::from_secs(8)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = with_retries("test", 2, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(ProviderError::transport("connection reset"))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_is_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retries("test", 3, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::not_found("nothing matched")) }
        })
        .await;
        assert_eq!(result.unwrap_err().kind, FailureKind::NotFound);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retries("test", 2, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::rate_limited("throttled")) }
        })
        .await;
        assert_eq!(result.unwrap_err().kind, FailureKind::RateLimited);
        assert_eq!(calls.load(Ordering::SeqCst), 3); // initial + 2 retries
    }
}
