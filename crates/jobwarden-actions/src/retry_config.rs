//! Bridges a catalog's [`RetrySpec`](jobwarden_model::RetrySpec) into the
//! retry primitive's builder-configured [`RetryConfig`].

use jobwarden_model::RetrySpec;
use jobwarden_retry::RetryConfig;

pub fn build(spec: &RetrySpec, name: impl Into<String>) -> RetryConfig {
    let mut builder = RetryConfig::builder()
        .name(name)
        .max_retries(spec.max_retries)
        .retry_delay(spec.delay)
        .jitter(spec.jitter)
        .modifier(spec.modifier);

    if let Some(max_delay) = spec.max_delay {
        builder = builder.max_delay(max_delay);
    }
    if let Some(max_duration) = spec.max_duration {
        builder = builder.max_duration(max_duration);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_retry::DelayModifier;
    use std::time::Duration;

    #[test]
    fn carries_every_field_through() {
        let spec = RetrySpec {
            max_retries: 3,
            delay: Duration::from_millis(10),
            max_delay: Some(Duration::from_millis(100)),
            max_duration: Some(Duration::from_secs(5)),
            jitter: Duration::from_millis(2),
            modifier: DelayModifier::Exponential,
        };
        // No public getters on RetryConfig beyond delay_for; exercise it
        // indirectly by checking the unjittered-equivalent shape compiles
        // and the builder doesn't panic.
        let _config = build(&spec, "job:task");
    }
}
