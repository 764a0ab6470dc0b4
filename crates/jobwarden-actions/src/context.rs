//! `ExecContext`: the explicit execution-context record a task attempt
//! carries instead of an ambient, typed-slot context. Replaces what the
//! original implementation threaded through `context.Context` values
//! (job name, event data, retry count, failed connections) with a plain
//! struct passed by value to each action.

use jobwarden_core::MetricRegistry;
use jobwarden_model::Connection;
use jobwarden_template::Value;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Carried through one task's retry loop (and, separately, through each of
/// its hooks). Cheap to clone: the mutable pieces are `Arc`-shared.
#[derive(Clone)]
pub struct ExecContext {
    pub job_name: Arc<str>,
    pub cancellation: CancellationToken,
    pub vars: Arc<HashMap<String, Value>>,
    pub metrics: MetricRegistry,
    /// Connections that failed on the previous attempt; `None` means "no
    /// previous attempt yet" (the default, full fan-out list applies).
    /// Narrowing to just the failed set on retry is carried over from the
    /// original implementation's per-attempt `getFailedConnections`.
    failed_connections: Arc<Mutex<Option<Vec<Connection>>>>,
}

impl ExecContext {
    pub fn new(
        job_name: impl Into<Arc<str>>,
        cancellation: CancellationToken,
        vars: HashMap<String, Value>,
        metrics: MetricRegistry,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            cancellation,
            vars: Arc::new(vars),
            metrics,
            failed_connections: Arc::new(Mutex::new(None)),
        }
    }

    /// A fresh context for a hook task: same job, cancellation and vars,
    /// but a clean retry/connection-failure slate, since a hook gets its
    /// own attempt budget rather than inheriting its parent's.
    pub fn for_hook(&self) -> Self {
        Self {
            job_name: Arc::clone(&self.job_name),
            cancellation: self.cancellation.clone(),
            vars: Arc::clone(&self.vars),
            metrics: self.metrics.clone(),
            failed_connections: Arc::new(Mutex::new(None)),
        }
    }

    /// Connections to try this attempt: the narrowed failed-set from the
    /// prior attempt if one exists, otherwise `default` (the task's
    /// configured list, already defaulted to `[Local]` by the caller).
    pub(crate) fn connections_to_try<'a>(&self, default: &'a [Connection]) -> std::borrow::Cow<'a, [Connection]> {
        match self.failed_connections.lock().clone() {
            Some(failed) if !failed.is_empty() => std::borrow::Cow::Owned(failed),
            _ => std::borrow::Cow::Borrowed(default),
        }
    }

    pub(crate) fn record_failed_connections(&self, failed: Vec<Connection>) {
        *self.failed_connections.lock() = Some(failed);
    }

    pub(crate) fn reset_failed_connections(&self) {
        *self.failed_connections.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_hook_resets_failed_connections_but_keeps_vars() {
        let vars = HashMap::from([("k".to_string(), Value::Str("v".to_string()))]);
        let ctx = ExecContext::new("job", CancellationToken::new(), vars, MetricRegistry::new());
        ctx.record_failed_connections(vec![Connection::Local]);

        let hook_ctx = ctx.for_hook();
        assert!(matches!(
            hook_ctx.connections_to_try(&[Connection::Local, Connection::Local]),
            std::borrow::Cow::Borrowed(_)
        ));
        assert_eq!(hook_ctx.vars.get("k"), Some(&Value::Str("v".to_string())));
    }
}
