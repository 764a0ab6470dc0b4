//! Wires one job's dispatcher, concurrency gate, task fan-out, job-level
//! hooks and event sources together.

use crate::context::RuntimeContext;
use jobwarden_actions::{vars, ExecContext};
use jobwarden_dispatch::{wrap_debounced, Dispatcher, Event, Listener, Signal};
use jobwarden_gate::Gate;
use jobwarden_model::{EventBinding, JobConfig};
use jobwarden_sources::{ContainerEventSource, LogFileSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A running job: the dispatcher, gate and task listener stay alive for as
/// long as its event sources' join handles are outstanding.
pub struct JobRuntime {
    name: String,
    handles: Vec<JoinHandle<()>>,
}

impl JobRuntime {
    /// Wires and starts `job`. Returns once every event source task has
    /// been spawned; sources run until `cancellation` fires.
    pub fn spawn(job: JobConfig, ctx: RuntimeContext, cancellation: CancellationToken) -> Self {
        let name = job.name.clone();
        let job = Arc::new(job);

        let gate = Gate::builder().capacity(job.concurrency).name(job.name.clone()).build();

        let dispatcher = Dispatcher::new(job.name.clone());
        let signal: Arc<dyn Signal> = wrap_debounced(dispatcher, job.debounce);

        signal.add_listener(listener(Arc::clone(&job), gate, ctx.clone(), cancellation.clone()));

        let handles = job
            .events
            .iter()
            .cloned()
            .filter_map(|binding| spawn_source(&job, binding, Arc::clone(&signal), &ctx, cancellation.clone()))
            .collect();

        Self { name, handles }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Waits for every event source task to finish. Only returns promptly
    /// once the runtime's cancellation token has fired.
    pub async fn shutdown(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

/// Builds the per-event listener: for every task configured on the job,
/// try to acquire the shared gate and spawn a fan-out worker; a saturated
/// gate drops the task for this event (the gate's own `Rejected` event and
/// metric already account for the drop).
fn listener(job: Arc<JobConfig>, gate: Gate, ctx: RuntimeContext, cancellation: CancellationToken) -> Listener {
    Arc::new(move |event: &Event| {
        let event_vars = event.as_vars();

        for task in &job.tasks {
            match gate.try_acquire() {
                Ok(permit) => {
                    let task = task.clone();
                    let job = Arc::clone(&job);
                    let exec_ctx = ExecContext::new(
                        job.name.clone(),
                        cancellation.clone(),
                        vars::build(&event_vars, &task.vars),
                        ctx.metrics.clone(),
                    );

                    tokio::spawn(async move {
                        let _permit = permit;
                        let result = jobwarden_actions::execute(&task, &exec_ctx).await;
                        let job_hooks = if result.is_ok() { &job.on_done } else { &job.on_failed };
                        jobwarden_actions::hooks::run(job_hooks, &exec_ctx).await;
                    });
                }
                Err(_full) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(job = %job.name, "gate saturated, dropping task for this event");
                }
            }
        }
    })
}

/// Spawns the background task backing `binding`, or registers it
/// synchronously (web events). Returns `None` when there is no long-lived
/// task to track.
fn spawn_source(
    job: &JobConfig,
    binding: EventBinding,
    signal: Arc<dyn Signal>,
    ctx: &RuntimeContext,
    cancellation: CancellationToken,
) -> Option<JoinHandle<()>> {
    let job_name = job.name.clone();

    match binding {
        EventBinding::Cron { spec } => {
            Some(tokio::spawn(
                async move { jobwarden_sources::cron::run(&job_name, &spec, signal, cancellation).await },
            ))
        }
        EventBinding::Interval { period } => {
            Some(tokio::spawn(jobwarden_sources::interval::run(period, signal, cancellation)))
        }
        EventBinding::OnInit => Some(tokio::spawn(jobwarden_sources::init::run(signal))),
        EventBinding::ContainerEvent {
            connection,
            name_pattern,
            image_pattern,
            actions,
            label_patterns,
            error_limit,
            error_policy,
            throttle,
        } => {
            let source = ContainerEventSource {
                job_name,
                connection,
                name_pattern,
                image_pattern,
                actions,
                label_patterns,
                error_limit,
                error_policy,
                throttle,
            };
            Some(tokio::spawn(source.run(signal, cancellation)))
        }
        EventBinding::LogFile {
            path,
            line_delimiter,
            regex,
            poll_interval,
        } => {
            let source = LogFileSource {
                job_name,
                path,
                line_delimiter,
                regex,
                poll_interval,
            };
            Some(tokio::spawn(source.run(signal, cancellation)))
        }
        EventBinding::WebEvent { name } => {
            ctx.web_events.register(name, signal);
            None
        }
    }
}
