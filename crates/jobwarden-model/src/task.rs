//! `Task`: the executable unit a job runs per dispatched event, plus the
//! `Connection` variants a command task can run under.

use jobwarden_retry::DelayModifier;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct RetryRaw {
    #[serde(skip_serializing_if = "is_zero_u32")]
    pub count: u32,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub jitter_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,
}

fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

fn is_zero_u64(n: &u64) -> bool {
    *n == 0
}

#[derive(Debug, Clone)]
pub struct RetrySpec {
    pub max_retries: u32,
    pub delay: Duration,
    pub max_delay: Option<Duration>,
    pub max_duration: Option<Duration>,
    pub jitter: Duration,
    pub modifier: DelayModifier,
}

impl RetryRaw {
    pub fn validate(&self) -> Result<RetrySpec, String> {
        Ok(RetrySpec {
            max_retries: self.count,
            delay: Duration::from_millis(self.delay_ms),
            max_delay: self.max_delay_ms.map(Duration::from_millis),
            max_duration: self.max_duration_ms.map(Duration::from_millis),
            jitter: Duration::from_millis(self.jitter_ms),
            modifier: self
                .modifier
                .as_deref()
                .map(DelayModifier::parse)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct ConnectionRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// A resolved connection backend for a single command task.
#[derive(Debug, Clone)]
pub enum Connection {
    Local,
    ContainerAttach {
        container_name: String,
        connection: Option<String>,
    },
    ContainerCreate {
        image: String,
        container_name: Option<String>,
        connection: Option<String>,
        volumes: Vec<String>,
        networks: Vec<String>,
    },
}

impl ConnectionRaw {
    /// First matching arm wins: an image means `ContainerCreate`; a bare
    /// container name means `ContainerAttach`; otherwise `Local`.
    pub fn resolve(&self) -> Connection {
        if let Some(image) = &self.image {
            Connection::ContainerCreate {
                image: image.clone(),
                container_name: self.container_name.clone(),
                connection: self.connection.clone(),
                volumes: self.volumes.clone(),
                networks: self.networks.clone(),
            }
        } else if let Some(name) = &self.container_name {
            Connection::ContainerAttach {
                container_name: name.clone(),
                connection: self.connection.clone(),
            }
        } else {
            Connection::Local
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct TaskRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "is_default_retry")]
    pub retry: RetryRaw,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub timeout_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on_done: Vec<TaskRaw>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on_fail: Vec<TaskRaw>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vars: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<ConnectionRaw>,
}

fn is_default_retry(retry: &RetryRaw) -> bool {
    retry.count == 0
        && retry.delay_ms == 0
        && retry.max_delay_ms.is_none()
        && retry.max_duration_ms.is_none()
        && retry.jitter_ms == 0
        && retry.modifier.is_none()
}

#[derive(Debug, Clone)]
pub enum Action {
    Command { text: String },
    Get { url: String },
    Post { url: String },
}

#[derive(Debug, Clone)]
pub struct Task {
    pub action: Action,
    pub headers: HashMap<String, String>,
    pub data: Option<serde_json::Value>,
    pub env: HashMap<String, String>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub retry: RetrySpec,
    pub timeout: Duration,
    pub on_done: Vec<Task>,
    pub on_fail: Vec<Task>,
    /// Ordered `(key, template)` pairs; each expanded with the prior
    /// entries already resolved, per the declaration-order invariant.
    pub vars: Vec<(String, String)>,
    pub connections: Vec<Connection>,
}

impl TaskRaw {
    pub fn validate(&self) -> Result<Task, String> {
        let actions = [self.command.is_some(), self.get.is_some(), self.post.is_some()];
        let active = actions.iter().filter(|a| **a).count();
        if active != 1 {
            return Err(format!(
                "a task must have exactly one of (command, get, post), found {active}"
            ));
        }

        if self.get.is_some() && self.data.is_some() {
            return Err("a get task cannot carry a data body".to_string());
        }

        let action = if let Some(text) = &self.command {
            if !self.headers.is_empty() || self.data.is_some() {
                return Err(format!(
                    "command cannot have data or headers, violating command: {text:?}"
                ));
            }
            Action::Command { text: text.clone() }
        } else if let Some(url) = &self.get {
            Action::Get { url: url.clone() }
        } else if let Some(url) = &self.post {
            Action::Post { url: url.clone() }
        } else {
            unreachable!("active arm count checked above")
        };

        if let Some(data) = &self.data {
            serde_json::to_vec(data).map_err(|e| format!("data is not JSON-serializable: {e}"))?;
        }

        let retry = self.retry.validate()?;
        let timeout = Duration::from_millis(self.timeout_ms);

        let on_done = self
            .on_done
            .iter()
            .map(TaskRaw::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let on_fail = self
            .on_fail
            .iter()
            .map(TaskRaw::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let connections = self.connections.iter().map(ConnectionRaw::resolve).collect();

        Ok(Task {
            action,
            headers: self.headers.clone(),
            data: self.data.clone(),
            env: self.env.clone(),
            working_dir: self.working_dir.clone(),
            user: self.user.clone(),
            group: self.group.clone(),
            retry,
            timeout,
            on_done,
            on_fail,
            vars: self.vars.clone(),
            connections,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_action_is_required() {
        let raw = TaskRaw::default();
        assert!(raw.validate().is_err());

        let raw = TaskRaw {
            command: Some("echo hi".to_string()),
            get: Some("http://x".to_string()),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn get_cannot_carry_a_body() {
        let raw = TaskRaw {
            get: Some("http://x".to_string()),
            data: Some(serde_json::json!({"a": 1})),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn command_cannot_carry_headers_or_data() {
        let raw = TaskRaw {
            command: Some("echo hi".to_string()),
            headers: HashMap::from([("X-Test".to_string(), "1".to_string())]),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn connection_resolution_prefers_image_then_container_name_then_local() {
        assert!(matches!(ConnectionRaw::default().resolve(), Connection::Local));

        let attach = ConnectionRaw {
            container_name: Some("c1".to_string()),
            ..Default::default()
        };
        assert!(matches!(attach.resolve(), Connection::ContainerAttach { .. }));

        let create = ConnectionRaw {
            container_name: Some("c1".to_string()),
            image: Some("alpine".to_string()),
            ..Default::default()
        };
        assert!(matches!(create.resolve(), Connection::ContainerCreate { .. }));
    }

    #[test]
    fn hooks_are_validated_recursively() {
        let raw = TaskRaw {
            command: Some("echo hi".to_string()),
            on_done: vec![TaskRaw::default()],
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }
}
