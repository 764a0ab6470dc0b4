//! Runs a task's `on_done`/`on_fail` hook chain. Hook failures are logged
//! and counted but never change the parent task's outcome.

use crate::context::ExecContext;
use jobwarden_model::Task;

pub async fn run(hooks: &[Task], ctx: &ExecContext) {
    for hook in hooks {
        let hook_ctx = ctx.for_hook();
        // `execute` boxed here breaks the execute <-> hooks::run async
        // recursion: without indirection the two futures would each embed
        // the other's state machine, an infinitely sized type rustc rejects.
        if let Err(_error) = Box::pin(crate::execute(hook, &hook_ctx)).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(job = %ctx.job_name, error = %_error, "hook task failed");
            ctx.metrics.inc_counter(
                "hook_failure_total",
                "hook tasks that failed after exhausting their own retries",
                &[("job", ctx.job_name.as_ref())],
            );
        }
    }
}
