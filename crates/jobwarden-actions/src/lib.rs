//! Task actions: the executable leaves of a job (§4.8 of the design).
//!
//! Every action composes the same shape: a retry loop (`jobwarden-retry`)
//! around a single "attempt", a per-attempt timeout, a panic guard so one
//! broken attempt cannot take the job runtime down with it, and a
//! done/fail hook chain that runs once after the retry loop settles.

pub mod command;
pub mod context;
pub mod error;
pub mod hooks;
pub mod http;
pub mod retry_config;
pub mod vars;

pub use context::ExecContext;
pub use error::ActionError;

use jobwarden_model::{Action, Task};
use std::time::Duration;

/// Runs `task` to its terminal outcome: retries per `task.retry`, applying
/// `task.timeout` to each attempt, then runs the matching hook chain.
/// Returns the retry layer's final result; hook failures never affect it.
pub async fn execute(task: &Task, ctx: &ExecContext) -> Result<(), ActionError> {
    let retry_config = retry_config::build(&task.retry, ctx.job_name.to_string());
    let policy = error::ActionRetryPolicy;
    let timeout = task.timeout;

    let result = jobwarden_retry::run(&retry_config, &policy, &ctx.cancellation, || {
        run_one_attempt(task, ctx, timeout)
    })
    .await;

    let outcome = if result.is_ok() { "success" } else { "failure" };
    ctx.metrics.inc_counter(
        "task_total",
        "task executions by terminal outcome",
        &[("job", ctx.job_name.as_ref()), ("result", outcome)],
    );

    match &result {
        Ok(()) => hooks::run(&task.on_done, ctx).await,
        Err(_) => hooks::run(&task.on_fail, ctx).await,
    }

    result
}

/// Runs one attempt in its own task (for panic isolation) and races it
/// against the attempt timeout and the global cancellation token. On a
/// timeout or cancellation the spawned task is aborted rather than merely
/// detached, so an in-flight subprocess/HTTP request is actually torn
/// down instead of continuing to run unobserved.
async fn run_one_attempt(task: &Task, ctx: &ExecContext, timeout: Duration) -> Result<(), ActionError> {
    ctx.metrics.inc_counter(
        "task_attempt_total",
        "task attempts started",
        &[("job", ctx.job_name.as_ref())],
    );

    let attempt_task = task.clone();
    let attempt_ctx = ctx.clone();
    let mut handle = jobwarden_core::spawn_guarded(async move { dispatch(&attempt_task, &attempt_ctx).await });

    let join_result = tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => {
            handle.abort();
            return Err(ActionError::Cancelled);
        }
        _ = sleep_for_timeout(timeout), if !timeout.is_zero() => {
            handle.abort();
            return Err(ActionError::Timeout);
        }
        result = &mut handle => result,
    };

    match jobwarden_core::into_guard_result(join_result) {
        Ok(result) => result,
        Err(panic_err) => Err(ActionError::Panic(panic_err)),
    }
}

/// `Duration::ZERO` means "no timeout", not "expire immediately" — the
/// `if !timeout.is_zero()` precondition on the `select!` branch keeps this
/// future from ever being polled in that case, rather than firing at once.
async fn sleep_for_timeout(timeout: Duration) {
    tokio::time::sleep(timeout).await
}

async fn dispatch(task: &Task, ctx: &ExecContext) -> Result<(), ActionError> {
    match &task.action {
        Action::Command { text } => command::attempt(text, task, ctx).await,
        Action::Get { url } => http::get(url, task, ctx).await,
        Action::Post { url } => http::post(url, task, ctx).await,
    }
}
