//! Connectivity-aware retry for remote calls.
//!
//! Only connectivity failures are retried; API, auth, and validation
//! errors surface immediately. The wait grows linearly with the attempt
//! number, and each wait posts a transient notice so the caller's UI can
//! show that a retry is in flight.

use std::future::Future;
use std::time::Duration;

use log::warn;
use notewell_core::notify::{NoticeKind, Notifier};
use notewell_core::Result;

/// Attempts made after the first failure.
pub const DEFAULT_RETRIES: u32 = 3;
/// Base wait; attempt `n` waits `n` times this.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(3000);

/// Run `op`, retrying connectivity failures up to `retries` times.
///
/// Attempt `n` (1-based) waits `base_delay * n` before re-running the
/// operation. The last connectivity error is returned once the budget
/// is spent.
pub async fn retry_with_backoff<T, F, Fut>(
    mut op: F,
    retries: u32,
    base_delay: Duration,
    notifier: &dyn Notifier,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_connectivity() && attempt < retries => {
                attempt += 1;
                warn!("connectivity failure, retry {attempt}/{retries}: {err}");
                notifier.notify(
                    NoticeKind::Info,
                    "Network error",
                    Some(&format!("Retrying ({attempt}/{retries})...")),
                );
                tokio::time::sleep(base_delay * attempt).await;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Convenience wrapper using the default budget.
pub async fn retry<T, F, Fut>(op: F, notifier: &dyn Notifier) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    retry_with_backoff(op, DEFAULT_RETRIES, DEFAULT_BASE_DELAY, notifier).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use notewell_core::notify::NullNotifier;
    use notewell_core::StoreError;
    use tokio::time::Instant;

    fn flaky(calls: Arc<AtomicU32>, failures: u32) -> impl FnMut() -> FlakyFut {
        move || FlakyFut {
            calls: calls.clone(),
            failures,
        }
    }

    struct FlakyFut {
        calls: Arc<AtomicU32>,
        failures: u32,
    }

    impl Future for FlakyFut {
        type Output = notewell_core::Result<u32>;

        fn poll(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Self::Output> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                std::task::Poll::Ready(Err(StoreError::connectivity("link down")))
            } else {
                std::task::Poll::Ready(Ok(n))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures_with_linear_waits() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result = retry_with_backoff(
            flaky(calls.clone(), 2),
            DEFAULT_RETRIES,
            DEFAULT_BASE_DELAY,
            &NullNotifier,
        )
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Waits of 3s then 6s under virtual time.
        assert_eq!(started.elapsed(), Duration::from_millis(9000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: notewell_core::Result<u32> =
            retry_with_backoff(flaky(calls.clone(), 10), 3, DEFAULT_BASE_DELAY, &NullNotifier)
                .await;

        assert!(matches!(result, Err(StoreError::Connectivity(_))));
        // One initial call plus three retries.
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_connectivity_errors_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let inner = calls.clone();

        let result: notewell_core::Result<()> = retry_with_backoff(
            move || {
                let inner = inner.clone();
                async move {
                    inner.fetch_add(1, Ordering::SeqCst);
                    Err(StoreError::api(403, "permission denied"))
                }
            },
            3,
            Duration::from_millis(1),
            &NullNotifier,
        )
        .await;

        assert!(matches!(result, Err(StoreError::Api { status: 403, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
