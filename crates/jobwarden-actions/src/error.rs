//! Errors a task attempt can fail with, and the retry policy that decides
//! which of them are worth retrying.

use jobwarden_core::PanicGuardError;
use jobwarden_retry::RetryPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{0} of {1} command connections failed")]
    ConnectionsFailed(usize, usize),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status code: {0}")]
    UnexpectedStatus(u16),
    #[error("attempt timed out")]
    Timeout,
    #[error("attempt panicked: {0}")]
    Panic(#[from] PanicGuardError),
    #[error("attempt aborted by shutdown")]
    Cancelled,
}

/// Every [`ActionError`] is retryable except a caught panic or a shutdown
/// cancellation: the panic guard's whole point is that a single
/// misbehaving attempt is logged and dropped, not retried into a loop of
/// the same panic, and a cancelled attempt means the process is shutting
/// down, not that this particular attempt is worth repeating.
pub struct ActionRetryPolicy;

impl RetryPolicy<ActionError> for ActionRetryPolicy {
    fn should_retry(&self, error: &ActionError) -> bool {
        !matches!(error, ActionError::Panic(_) | ActionError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_panic_is_not_retried_but_everything_else_is() {
        let policy = ActionRetryPolicy;
        assert!(!policy.should_retry(&ActionError::Panic(PanicGuardError {
            message: "boom".to_string()
        })));
        assert!(!policy.should_retry(&ActionError::Cancelled));
        assert!(policy.should_retry(&ActionError::Timeout));
        assert!(policy.should_retry(&ActionError::UnexpectedStatus(500)));
        assert!(policy.should_retry(&ActionError::ConnectionsFailed(1, 2)));
    }
}
