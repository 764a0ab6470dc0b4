//! Panic isolation for task attempts.
//!
//! Every task attempt runs inside this guard so a single misbehaving task
//! cannot take down the job runtime. Rust has no implicit exception
//! propagation across `await` points the way some runtimes do, but a panic
//! inside a spawned task *does* tear down that task's stack and, left
//! unguarded, would be silently swallowed or (with `panic = "abort"`)
//! bring the whole process down. We isolate the attempt in its own task and
//! turn a panic into an ordinary `Err`.

use std::fmt;
use std::future::Future;

/// A caught panic, downcast to a message where possible.
#[derive(Debug, Clone)]
pub struct PanicGuardError {
    pub message: String,
}

impl fmt::Display for PanicGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task attempt panicked: {}", self.message)
    }
}

impl std::error::Error for PanicGuardError {}

/// Runs `fut` to completion, catching any panic and returning it as an
/// error instead of propagating it. Requires the same `Send + 'static`
/// bounds as [`tokio::spawn`], since that is how isolation is achieved.
pub async fn guard_panic<F, T>(fut: F) -> Result<T, PanicGuardError>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    into_guard_result(tokio::spawn(fut).await)
}

/// Spawns `fut` in its own task, isolating a panic from the caller's task.
/// Unlike [`guard_panic`], the [`tokio::task::JoinHandle`] is handed back
/// so the caller can `abort()` it (on a timeout or external cancellation)
/// instead of only being able to await it to completion.
pub fn spawn_guarded<F, T>(fut: F) -> tokio::task::JoinHandle<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
}

/// Converts a [`tokio::task::JoinHandle`]'s result into the same
/// [`PanicGuardError`] shape [`guard_panic`] produces, for callers that
/// spawned via [`spawn_guarded`] and raced the handle against a timeout or
/// cancellation themselves.
pub fn into_guard_result<T>(result: Result<T, tokio::task::JoinError>) -> Result<T, PanicGuardError> {
    match result {
        Ok(value) => Ok(value),
        Err(join_err) if join_err.is_panic() => {
            let payload = join_err.into_panic();
            let message = payload
                .downcast_ref::<&'static str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Err(PanicGuardError { message })
        }
        Err(join_err) => Err(PanicGuardError {
            message: format!("task cancelled: {join_err}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_passes_through() {
        let result = guard_panic(async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn panic_is_caught() {
        let result = guard_panic(async {
            panic!("boom");
            #[allow(unreachable_code)]
            0
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.message.contains("boom"));
    }
}
