//! Configuration for the retry primitive.

use crate::backoff::DelayModifier;
use crate::events::RetryEvent;
use jobwarden_core::{EventListeners, FnListener};
use rand::Rng;
use std::time::Duration;

/// Retry parameters for a single task or action.
#[derive(Clone)]
pub struct RetryConfig {
    pub(crate) max_retries: u32,
    pub(crate) retry_delay: Duration,
    pub(crate) max_delay: Option<Duration>,
    pub(crate) max_duration: Option<Duration>,
    pub(crate) jitter: Duration,
    pub(crate) modifier: DelayModifier,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfig {
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Computes the delay before the attempt after `n` failures (0-indexed),
    /// applying the cap and then jitter, in that order.
    pub(crate) fn delay_for(&self, n: u32) -> Duration {
        let mut delay = self.modifier.delay_for(self.retry_delay, n);
        if let Some(cap) = self.max_delay {
            delay = delay.min(cap);
        }
        if self.jitter > Duration::ZERO {
            let jitter_ms = self.jitter.as_millis() as i64;
            let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);
            let delay_ms = delay.as_millis() as i64 + offset;
            delay = Duration::from_millis(delay_ms.max(0) as u64);
        }
        delay
    }
}

/// Builder for [`RetryConfig`]. Defaults: `max_retries = 0` (one attempt,
/// no retries), constant 1s delay, no cap, no deadline, no jitter.
pub struct RetryConfigBuilder {
    max_retries: u32,
    retry_delay: Duration,
    max_delay: Option<Duration>,
    max_duration: Option<Duration>,
    jitter: Duration,
    modifier: DelayModifier,
    name: String,
    event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfigBuilder {
    pub fn new() -> Self {
        Self {
            max_retries: 0,
            retry_delay: Duration::from_secs(1),
            max_delay: None,
            max_duration: None,
            jitter: Duration::ZERO,
            modifier: DelayModifier::Constant,
            name: "<unnamed>".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, d: Duration) -> Self {
        self.retry_delay = d;
        self
    }

    pub fn max_delay(mut self, d: Duration) -> Self {
        self.max_delay = Some(d);
        self
    }

    pub fn max_duration(mut self, d: Duration) -> Self {
        self.max_duration = Some(d);
        self
    }

    pub fn jitter(mut self, d: Duration) -> Self {
        self.jitter = d;
        self
    }

    pub fn modifier(mut self, modifier: DelayModifier) -> Self {
        self.modifier = modifier;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_retry<F>(mut self, f: F) -> Self
    where
        F: Fn(u32, Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Retrying { attempt, delay, .. } = event {
                f(*attempt, *delay);
            }
        }));
        self
    }

    pub fn on_exhausted<F>(mut self, f: F) -> Self
    where
        F: Fn(u32) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let RetryEvent::Exhausted { attempts, .. } = event {
                f(*attempts);
            }
        }));
        self
    }

    pub fn build(self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            retry_delay: self.retry_delay,
            max_delay: self.max_delay,
            max_duration: self.max_duration,
            jitter: self.jitter,
            modifier: self.modifier,
            name: self.name,
            event_listeners: self.event_listeners,
        }
    }
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_is_applied_before_jitter() {
        let config = RetryConfig::builder()
            .modifier(DelayModifier::Exponential)
            .retry_delay(Duration::from_millis(100))
            .max_delay(Duration::from_millis(150))
            .build();
        // attempt 3 would be 800ms uncapped; must never exceed the cap + jitter (0 here).
        assert_eq!(config.delay_for(3), Duration::from_millis(150));
    }

    #[test]
    fn zero_jitter_is_deterministic() {
        let config = RetryConfig::builder()
            .retry_delay(Duration::from_millis(50))
            .build();
        assert_eq!(config.delay_for(0), Duration::from_millis(50));
        assert_eq!(config.delay_for(5), Duration::from_millis(50));
    }
}
