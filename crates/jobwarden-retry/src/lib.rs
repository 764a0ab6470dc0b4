//! Bounded retry with constant/exponential/Fibonacci backoff, optional
//! jitter, a per-delay cap and an overall deadline.
//!
//! A task attempt is retried up to `max_retries` times, or until
//! `max_duration` has elapsed since the first attempt, whichever comes
//! first. The growth of the delay between attempts is controlled by a
//! [`DelayModifier`]; jitter is applied after the per-delay cap, so the cap
//! bounds the *un-jittered* delay.

pub mod backoff;
pub mod config;
pub mod events;
pub mod policy;

pub use backoff::DelayModifier;
pub use config::{RetryConfig, RetryConfigBuilder};
pub use events::RetryEvent;
pub use policy::{RetryAll, RetryPolicy};

use std::time::Instant;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Runs `op` to completion, retrying on failure according to `config` and
/// `policy`. Returns `Ok` on the first successful attempt, or the last
/// attempt's `Err` once retries are exhausted, the deadline passes, or
/// `cancellation` fires.
///
/// `op` is re-invoked from scratch on every attempt; callers that need
/// per-attempt state (a fresh connection, a fresh context) should build it
/// inside the closure they pass in.
pub async fn run<Op, Fut, T, E, P>(
    config: &RetryConfig,
    policy: &P,
    cancellation: &CancellationToken,
    mut op: Op,
) -> Result<T, E>
where
    Op: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    P: RetryPolicy<E>,
{
    let start = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        let result = op().await;

        match result {
            Ok(value) => {
                if attempt > 0 {
                    config.event_listeners.emit(&RetryEvent::Succeeded {
                        source: config.name.clone(),
                        attempts: attempt + 1,
                        timestamp: Instant::now(),
                    });
                }
                return Ok(value);
            }
            Err(error) => {
                let retryable = policy.should_retry(&error);
                let retries_left = attempt < config.max_retries;
                let deadline_ok = config
                    .max_duration
                    .map(|max| start.elapsed() < max)
                    .unwrap_or(true);
                let cancelled = cancellation.is_cancelled();

                if !retryable || !retries_left || !deadline_ok || cancelled {
                    config.event_listeners.emit(&RetryEvent::Exhausted {
                        source: config.name.clone(),
                        attempts: attempt + 1,
                        timestamp: Instant::now(),
                    });
                    return Err(error);
                }

                let delay = config.delay_for(attempt);
                config.event_listeners.emit(&RetryEvent::Retrying {
                    source: config.name.clone(),
                    attempt: attempt + 1,
                    delay,
                    timestamp: Instant::now(),
                });

                tokio::select! {
                    _ = sleep(delay) => {}
                    _ = cancellation.cancelled() => {
                        config.event_listeners.emit(&RetryEvent::Exhausted {
                            source: config.name.clone(),
                            attempts: attempt + 1,
                            timestamp: Instant::now(),
                        });
                        return Err(error);
                    }
                }

                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_first_try_without_retrying() {
        let config = RetryConfig::builder().max_retries(3).build();
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result: Result<_, ()> = run(&config, &RetryAll, &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(42)
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_up_to_the_configured_limit_then_gives_up() {
        let config = RetryConfig::builder()
            .max_retries(2)
            .retry_delay(Duration::from_millis(1))
            .build();
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = run(&config, &RetryAll, &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("boom")
        })
        .await;

        assert_eq!(result, Err("boom"));
        // initial attempt + 2 retries = 3 calls
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_a_couple_of_failures() {
        let config = RetryConfig::builder()
            .max_retries(5)
            .retry_delay(Duration::from_millis(1))
            .build();
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = run(&config, &RetryAll, &token, || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err("not yet")
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn a_non_retryable_error_stops_immediately() {
        let config = RetryConfig::builder()
            .max_retries(5)
            .retry_delay(Duration::from_millis(1))
            .build();
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let result = run(&config, &|e: &&str| *e != "fatal", &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("fatal")
        })
        .await;

        assert_eq!(result, Err("fatal"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_retrying_between_attempts() {
        let config = RetryConfig::builder()
            .max_retries(10)
            .retry_delay(Duration::from_secs(60))
            .build();
        let token = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let token_clone = token.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(5)).await;
            token_clone.cancel();
        });

        let result = run(&config, &RetryAll, &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("boom")
        })
        .await;

        assert_eq!(result, Err("boom"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
