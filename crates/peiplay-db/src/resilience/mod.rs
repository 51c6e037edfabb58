//! Retry and circuit breaking for repository calls
//!
//! Reads go through [`DbResilience::run`] (retry + breaker). Writes and
//! transactions go through [`DbResilience::guard`] (breaker only) so a
//! statement is never executed twice. Only infrastructure failures count
//! against the breaker; a constraint violation is a healthy database
//! answering "no".

mod breaker;
mod retry;

use std::future::Future;

use peiplay_common::ResilienceConfig;
use peiplay_core::{DomainError, RepoResult};

pub use breaker::{BreakerConfig, BreakerState, CircuitBreaker};
pub use retry::RetryPolicy;

#[derive(Debug)]
pub struct DbResilience {
    retry: RetryPolicy,
    breaker: CircuitBreaker,
}

impl Default for DbResilience {
    fn default() -> Self {
        Self::new(&ResilienceConfig::default())
    }
}

impl DbResilience {
    pub fn new(config: &ResilienceConfig) -> Self {
        Self::with_parts(RetryPolicy::from(config), BreakerConfig::from(config))
    }

    pub fn with_parts(retry: RetryPolicy, breaker: BreakerConfig) -> Self {
        Self {
            retry,
            breaker: CircuitBreaker::new(breaker),
        }
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.state()
    }

    /// Run an idempotent operation with retry and circuit breaking
    pub async fn run<T, F, Fut>(&self, op: &'static str, f: F) -> RepoResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RepoResult<T>>,
    {
        let mut retry = 0;
        loop {
            self.admit(op)?;
            let result = f().await;
            self.record(&result);

            match result {
                Err(DomainError::DatabaseUnavailable(ref reason))
                    if retry + 1 < self.retry.max_attempts =>
                {
                    let delay = self.retry.delay(retry);
                    tracing::warn!(
                        op,
                        attempt = retry + 1,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "Transient database error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                other => return other,
            }
        }
    }

    /// Run a single attempt through the breaker
    pub async fn guard<T, Fut>(&self, op: &'static str, fut: Fut) -> RepoResult<T>
    where
        Fut: Future<Output = RepoResult<T>>,
    {
        self.admit(op)?;
        let result = fut.await;
        self.record(&result);
        result
    }

    fn admit(&self, op: &'static str) -> RepoResult<()> {
        if self.breaker.allow() {
            Ok(())
        } else {
            tracing::warn!(op, "Database circuit open, failing fast");
            Err(DomainError::ServiceUnavailable(
                "database temporarily unavailable".to_string(),
            ))
        }
    }

    fn record<T>(&self, result: &RepoResult<T>) {
        match result {
            Err(e) if e.is_infrastructure() => self.breaker.record_failure(),
            _ => self.breaker.record_success(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn fast() -> DbResilience {
        DbResilience::with_parts(
            RetryPolicy {
                max_attempts: 3,
                initial_delay: Duration::from_millis(1),
                multiplier: 2,
                max_delay: Duration::from_millis(5),
            },
            BreakerConfig {
                failure_threshold: 5,
                success_threshold: 2,
                reset_timeout: Duration::from_secs(90),
            },
        )
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let r = fast();
        let calls = AtomicU32::new(0);
        let out = r
            .run("test.flaky", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DomainError::DatabaseUnavailable("reset".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(out.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let r = fast();
        let calls = AtomicU32::new(0);
        let out: RepoResult<()> = r
            .run("test.down", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::DatabaseUnavailable("refused".into()))
            })
            .await;
        assert!(matches!(out, Err(DomainError::DatabaseUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_business_errors_not_retried_or_counted() {
        let r = fast();
        let calls = AtomicU32::new(0);
        for _ in 0..10 {
            let out: RepoResult<()> = r
                .run("test.conflict", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(DomainError::EmailAlreadyExists)
                })
                .await;
            assert!(matches!(out, Err(DomainError::EmailAlreadyExists)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 10);
        assert_eq!(r.breaker_state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_open_breaker_fails_fast() {
        let r = fast();
        for _ in 0..5 {
            let _: RepoResult<()> = r
                .guard("test.write", async {
                    Err(DomainError::DatabaseError("boom".into()))
                })
                .await;
        }
        assert_eq!(r.breaker_state(), BreakerState::Open);

        let calls = AtomicU32::new(0);
        let out = r
            .run("test.read", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;
        assert!(matches!(out, Err(DomainError::ServiceUnavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_guard_runs_once() {
        let r = fast();
        let calls = AtomicU32::new(0);
        let out: RepoResult<()> = r
            .guard("test.write", async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::DatabaseUnavailable("reset".into()))
            })
            .await;
        assert!(out.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
