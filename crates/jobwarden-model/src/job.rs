//! `JobConfig`: a named, validated job — bindings, tasks and hooks.

use crate::error::ModelError;
use crate::event::{EventBinding, EventBindingRaw};
use crate::task::{Task, TaskRaw};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct HooksRaw {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub done: Vec<TaskRaw>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<TaskRaw>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct JobConfigRaw {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    pub concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<i64>,
    pub events: Vec<EventBindingRaw>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskRaw>,
    #[serde(skip_serializing_if = "is_default_hooks")]
    pub hooks: HooksRaw,
}

fn is_default_hooks(hooks: &HooksRaw) -> bool {
    hooks.done.is_empty() && hooks.failed.is_empty()
}

#[derive(Debug, Clone)]
pub struct JobConfig {
    pub name: String,
    pub description: Option<String>,
    pub disabled: bool,
    /// Always >= 1; a catalog value of 0 is coerced up.
    pub concurrency: usize,
    /// `None` disables debouncing; a negative raw value is the same as
    /// `None` per the dispatcher's contract.
    pub debounce: Option<Duration>,
    pub events: Vec<EventBinding>,
    pub tasks: Vec<Task>,
    pub on_done: Vec<Task>,
    pub on_failed: Vec<Task>,
}

impl JobConfigRaw {
    pub fn validate(&self) -> Result<JobConfig, ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::InvalidJob {
                job: self.name.clone(),
                reason: "job name must not be empty".to_string(),
            });
        }

        let events = self
            .events
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                raw.validate()
                    .map(EventBinding::promote_reboot)
                    .map_err(|reason| ModelError::InvalidEventBinding {
                        job: self.name.clone(),
                        index,
                        reason,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = self.validate_tasks(&self.tasks)?;
        let on_done = self.validate_tasks(&self.hooks.done)?;
        let on_failed = self.validate_tasks(&self.hooks.failed)?;

        let debounce = match self.debounce_ms {
            Some(ms) if ms >= 0 => Some(Duration::from_millis(ms as u64)),
            _ => None,
        };

        Ok(JobConfig {
            name: self.name.clone(),
            description: self.description.clone(),
            disabled: self.disabled,
            concurrency: self.concurrency.max(1),
            debounce,
            events,
            tasks,
            on_done,
            on_failed,
        })
    }

    fn validate_tasks(&self, tasks: &[TaskRaw]) -> Result<Vec<Task>, ModelError> {
        tasks
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                raw.validate().map_err(|reason| ModelError::InvalidTask {
                    job: self.name.clone(),
                    index,
                    reason,
                })
            })
            .collect()
    }
}
