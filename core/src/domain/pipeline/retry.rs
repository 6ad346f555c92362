use std::{fmt::Display, future::Future, time::Duration};

use tracing::warn;

use crate::domain::{common::entities::app_errors::Transience, pipeline::state::Stage};

/// Upper bound for the computed exponential delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// Upper bound for a delay requested by the collaborator itself.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Timeout and retry rules for one external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at [`MAX_BACKOFF`].
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }

    fn delay_for<E: Transience>(&self, error: &E, retry: u32) -> Duration {
        let backoff = self.backoff(retry);
        match error.retry_after() {
            Some(requested) => requested.max(backoff).min(MAX_RETRY_AFTER),
            None => backoff,
        }
    }

    /// Run `call` under the per-attempt timeout, retrying transient failures.
    /// Returns the value or the last error, together with the number of
    /// attempts made.
    pub async fn run<T, E, F, Fut>(&self, stage: Stage, mut call: F) -> Result<(T, u32), (E, u32)>
    where
        E: Transience + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(outcome) => outcome,
                Err(_) => Err(E::timed_out(self.timeout)),
            };

            match outcome {
                Ok(value) => return Ok((value, attempt)),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = self.delay_for(&e, attempt);
                    warn!(
                        %stage,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::domain::common::entities::app_errors::GenerationError;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_millis(500));
        assert_eq!(p.backoff(2), Duration::from_millis(1000));
        assert_eq!(p.backoff(3), Duration::from_millis(2000));
        assert_eq!(p.backoff(10), MAX_BACKOFF);
        assert_eq!(p.backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_retry_after_overrides_shorter_backoff() {
        let p = policy();
        let limited = GenerationError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert_eq!(p.delay_for(&limited, 1), Duration::from_secs(3));
        let huge = GenerationError::RateLimited {
            retry_after: Some(Duration::from_secs(3600)),
        };
        assert_eq!(p.delay_for(&huge, 1), MAX_RETRY_AFTER);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_error_is_not_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result: Result<((), u32), (GenerationError, u32)> = policy()
            .run(Stage::Generating, || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err(GenerationError::Rejected("bad request".into())) }
            })
            .await;

        assert_eq!(
            result,
            Err((GenerationError::Rejected("bad request".into()), 1))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out_and_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let result = policy()
            .run(Stage::Generating, || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                    }
                    Ok::<_, GenerationError>("done")
                }
            })
            .await;

        assert_eq!(result, Ok(("done", 2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let result: Result<((), u32), (GenerationError, u32)> = policy()
            .run(Stage::Generating, || async {
                Err(GenerationError::Unavailable("503".into()))
            })
            .await;

        assert_eq!(result, Err((GenerationError::Unavailable("503".into()), 3)));
    }
}
