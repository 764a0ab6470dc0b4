//! The `Command` action: fans a single attempt out across every configured
//! connection, narrowing to just the failed ones on the next retry.

use crate::context::ExecContext;
use crate::error::ActionError;
use jobwarden_connections::ExecRequest;
use jobwarden_model::{Connection, Task};
use std::collections::HashMap;

/// Connections to use when a task declares none: a single local run.
fn default_connections() -> Vec<Connection> {
    vec![Connection::Local]
}

pub async fn attempt(text: &str, task: &Task, ctx: &ExecContext) -> Result<(), ActionError> {
    let configured = if task.connections.is_empty() {
        default_connections()
    } else {
        task.connections.clone()
    };
    let connections = ctx.connections_to_try(&configured).into_owned();

    let command = jobwarden_template::evaluate_or_original(text, &ctx.vars);
    let env = build_env(task, ctx);

    let mut failed = Vec::new();
    for conn in &connections {
        let request = ExecRequest {
            command: command.clone(),
            env: env.clone(),
            working_dir: task.working_dir.clone(),
            user: task.user.clone(),
            group: task.group.clone(),
        };

        match jobwarden_connections::run(conn, &request, &ctx.cancellation).await {
            Ok(_output) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(job = %ctx.job_name, "command connection succeeded");
            }
            Err(_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(job = %ctx.job_name, error = %_error, "command connection failed");
                failed.push(conn.clone());
            }
        }
    }

    if failed.is_empty() {
        ctx.reset_failed_connections();
        Ok(())
    } else {
        let failed_count = failed.len();
        let total = connections.len();
        ctx.record_failed_connections(failed);
        Err(ActionError::ConnectionsFailed(failed_count, total))
    }
}

/// Merges the task's env over the process environment, uppercasing keys
/// and expanding each value as a template, per the local connection's
/// documented merge contract (shared here since every connection backend
/// receives the same already-merged table).
fn build_env(task: &Task, ctx: &ExecContext) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    for (key, value) in &task.env {
        let expanded = jobwarden_template::evaluate_or_original(value, &ctx.vars);
        env.insert(key.to_ascii_uppercase(), expanded);
    }
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_core::MetricRegistry;
    use jobwarden_model::task::{Action, RetrySpec};
    use jobwarden_retry::DelayModifier;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn task(text: &str) -> Task {
        Task {
            action: Action::Command { text: text.to_string() },
            headers: HashMap::new(),
            data: None,
            env: HashMap::from([("greeting".to_string(), "hello {{ name }}".to_string())]),
            working_dir: None,
            user: None,
            group: None,
            retry: RetrySpec {
                max_retries: 0,
                delay: Duration::ZERO,
                max_delay: None,
                max_duration: None,
                jitter: Duration::ZERO,
                modifier: DelayModifier::Constant,
            },
            timeout: Duration::ZERO,
            on_done: Vec::new(),
            on_fail: Vec::new(),
            vars: Vec::new(),
            connections: Vec::new(),
        }
    }

    fn ctx() -> ExecContext {
        let vars = HashMap::from([("name".to_string(), jobwarden_template::Value::Str("world".to_string()))]);
        ExecContext::new("job", CancellationToken::new(), vars, MetricRegistry::new())
    }

    #[tokio::test]
    async fn runs_the_expanded_command_locally_by_default() {
        let task = task("echo hi");
        let ctx = ctx();
        assert!(attempt("echo hi", &task, &ctx).await.is_ok());
    }

    #[tokio::test]
    async fn env_values_are_expanded_and_keys_uppercased() {
        let task = task("true");
        let ctx = ctx();
        let env = build_env(&task, &ctx);
        assert_eq!(env.get("GREETING"), Some(&"hello world".to_string()));
        assert!(env.get("greeting").is_none());
    }

    #[tokio::test]
    async fn a_failing_command_records_the_failed_connection() {
        let task = task("false");
        let ctx = ctx();
        let result = attempt("false", &task, &ctx).await;
        assert!(result.is_err());

        // Next attempt sees a narrowed (still [Local]) list, not an empty one.
        let narrowed = ctx.connections_to_try(&[]);
        assert_eq!(narrowed.len(), 1);
    }
}
