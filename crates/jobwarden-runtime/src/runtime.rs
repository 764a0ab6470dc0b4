//! The whole catalog's worth of jobs, wired and running together.

use crate::context::RuntimeContext;
use crate::job::JobRuntime;
use jobwarden_model::JobConfig;
use tokio_util::sync::CancellationToken;

/// Every enabled job from a loaded catalog, spawned and running. Disabled
/// jobs are skipped entirely; they never acquire a gate or dispatcher.
pub struct Runtime {
    jobs: Vec<JobRuntime>,
}

impl Runtime {
    pub fn spawn(jobs: Vec<JobConfig>, ctx: RuntimeContext, cancellation: CancellationToken) -> Self {
        let jobs = jobs
            .into_iter()
            .filter_map(|job| {
                if job.disabled {
                    #[cfg(feature = "tracing")]
                    tracing::info!(job = %job.name, "job is disabled, skipping");
                    None
                } else {
                    Some(JobRuntime::spawn(job, ctx.clone(), cancellation.clone()))
                }
            })
            .collect();

        Self { jobs }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Waits for every job's event sources to wind down. Callers typically
    /// cancel the shared [`CancellationToken`] first and then await this.
    pub async fn shutdown(self) {
        for job in self.jobs {
            job.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_core::MetricRegistry;
    use jobwarden_model::EventBinding;
    use jobwarden_sources::WebEventRegistry;
    use std::sync::Arc;

    fn ctx() -> RuntimeContext {
        RuntimeContext::new(MetricRegistry::new(), Arc::new(WebEventRegistry::new()))
    }

    #[tokio::test]
    async fn disabled_jobs_are_skipped() {
        let jobs = vec![JobConfig {
            name: "disabled".to_string(),
            description: None,
            disabled: true,
            concurrency: 1,
            debounce: None,
            events: vec![EventBinding::OnInit],
            tasks: Vec::new(),
            on_done: Vec::new(),
            on_failed: Vec::new(),
        }];

        let cancellation = CancellationToken::new();
        let runtime = Runtime::spawn(jobs, ctx(), cancellation.clone());
        assert_eq!(runtime.job_count(), 0);

        cancellation.cancel();
        runtime.shutdown().await;
    }
}
