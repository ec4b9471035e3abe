// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::AppError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry an async operation with exponential backoff.
pub async fn retry_async<F, Fut, T, E>(
    mut op: F,
    attempts: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = initial_delay;
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(v) => return Ok(v),
            Err(_) if attempt < attempts => {
                sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Outcome of one attempt as seen by [`retry_classified`].
#[derive(Debug)]
pub enum Attempt<T> {
    /// Terminal; returned as-is.
    Done(T),
    /// Pre-inclusion failure; another attempt may follow.
    Retry(AppError),
    /// Surfaced immediately without consuming the remaining budget.
    Fatal(AppError),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
            jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// No sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Exponential part only: `min(base * 2^(attempt-1), max)`.
    pub fn backoff_floor(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        let floor = self.backoff_floor(attempt);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return floor;
        }
        floor + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Bounded retry loop over classified attempts. Exhaustion yields
/// [`AppError::SubmissionExhausted`] carrying the last transient error.
pub async fn retry_classified<F, Fut, T>(
    policy: &RetryPolicy,
    action: &str,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Attempt<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last = None;
    for attempt in 1..=max_attempts {
        match op(attempt).await {
            Attempt::Done(v) => return Ok(v),
            Attempt::Fatal(e) => return Err(e),
            Attempt::Retry(e) => {
                if attempt < max_attempts {
                    let delay = policy.backoff(attempt);
                    tracing::warn!(
                        target: "submit",
                        action,
                        attempt,
                        max_attempts,
                        rate_limited = e.is_rate_limited(),
                        backoff_ms = delay.as_millis() as u64,
                        error = %e,
                        "Attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
                last = Some(e);
            }
        }
    }
    Err(AppError::SubmissionExhausted {
        action: action.to_string(),
        attempts: max_attempts,
        last: Box::new(
            last.unwrap_or_else(|| AppError::NetworkUnavailable("no attempt recorded".into())),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let counter = AtomicUsize::new(0);
        let res: Result<u32, ()> = retry_async(
            |_| {
                let current = counter.fetch_add(1, Ordering::Relaxed);
                async move { if current < 2 { Err(()) } else { Ok(7) } }
            },
            4,
            Duration::from_millis(1),
        )
        .await;

        assert_eq!(res.unwrap(), 7);
        assert!(counter.load(Ordering::Relaxed) >= 3);
    }

    #[tokio::test]
    async fn classified_retry_stops_on_fatal() {
        let calls = AtomicUsize::new(0);
        let res: Result<(), AppError> =
            retry_classified(&RetryPolicy::immediate(5), "approve", |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Attempt::Fatal(AppError::Signing("bad chain id".into())) }
            })
            .await;

        assert!(matches!(res, Err(AppError::Signing(_))));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn classified_retry_exhausts_with_last_error() {
        let res: Result<(), AppError> =
            retry_classified(&RetryPolicy::immediate(3), "stake", |attempt| async move {
                Attempt::Retry(AppError::NetworkUnavailable(format!("attempt {attempt}")))
            })
            .await;

        match res {
            Err(AppError::SubmissionExhausted {
                action,
                attempts,
                last,
            }) => {
                assert_eq!(action, "stake");
                assert_eq!(attempts, 3);
                assert!(last.to_string().contains("attempt 3"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(1500),
            jitter: Duration::ZERO,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(1500));
        assert_eq!(policy.backoff(9), Duration::from_millis(1500));
    }

    #[test]
    fn jitter_stays_within_window() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(100),
            jitter: Duration::from_millis(50),
        };
        for _ in 0..32 {
            let d = policy.backoff(2);
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(150));
        }
    }
}
