//! Decides whether a failed attempt should be retried.

/// Whether an error is worth retrying. Most callers use
/// [`RetryAll`](RetryPolicy::retry_all), which retries every error; task
/// actions that want to distinguish a permanent failure (bad config, 4xx
/// response) from a transient one (connection refused, 5xx) can supply a
/// predicate instead.
pub trait RetryPolicy<E>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retries on every error. The default for [`RetryConfig`](crate::RetryConfig).
pub struct RetryAll;

impl<E> RetryPolicy<E> for RetryAll {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        self(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_all_always_retries() {
        let policy = RetryAll;
        assert!(policy.should_retry(&"anything"));
    }

    #[test]
    fn a_closure_can_be_used_as_a_policy() {
        let policy = |e: &i32| *e != 404;
        assert!(policy.should_retry(&500));
        assert!(!policy.should_retry(&404));
    }
}
