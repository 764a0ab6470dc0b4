//! `EventBinding`: exactly one arm active per binding, validated at load
//! time against the raw, serde-deserialized shape.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Container-engine event error policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorPolicy {
    Reconnect,
    GiveUp,
    Kill,
}

/// Raw, as-deserialized shape of a job's event list entry. Mirrors the
/// catalog's flat-object-with-optional-fields encoding: a binding sets
/// exactly one of these groups.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct EventBindingRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_event: Option<ContainerEventRaw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<LogFileRaw>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_event: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct ContainerEventRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pattern: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub label_patterns: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_policy: Option<ErrorPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub throttle_ms: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(deny_unknown_fields, default)]
pub struct LogFileRaw {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

/// Validated, strongly typed binding. The active arm is exactly the one
/// that passed validation; all compiled regexes are ready to use.
#[derive(Debug, Clone)]
pub enum EventBinding {
    Cron { spec: String },
    Interval { period: Duration },
    OnInit,
    ContainerEvent {
        connection: Option<String>,
        name_pattern: Regex,
        image_pattern: Regex,
        actions: Vec<String>,
        label_patterns: HashMap<String, Regex>,
        error_limit: u32,
        error_policy: ErrorPolicy,
        throttle: Duration,
    },
    LogFile {
        path: String,
        line_delimiter: String,
        regex: Regex,
        poll_interval: Duration,
    },
    WebEvent { name: String },
}

impl EventBindingRaw {
    /// Converts the raw binding into a validated [`EventBinding`], failing
    /// unless exactly one arm is set.
    pub fn validate(&self) -> Result<EventBinding, String> {
        let arms = [
            self.cron.is_some(),
            self.interval.is_some(),
            self.on_init.unwrap_or(false),
            self.container_event.is_some(),
            self.log_file.is_some(),
            self.web_event.is_some(),
        ];
        let active = arms.iter().filter(|a| **a).count();
        if active != 1 {
            return Err(format!(
                "a single event binding must have exactly one of (cron, interval, onInit, \
                 containerEvent, logFile, webEvent), found {active}"
            ));
        }

        if let Some(spec) = &self.cron {
            return Ok(EventBinding::Cron { spec: spec.clone() });
        }
        if let Some(secs) = self.interval {
            if secs == 0 {
                return Err("interval must be greater than 0".to_string());
            }
            return Ok(EventBinding::Interval {
                period: Duration::from_secs(secs),
            });
        }
        if self.on_init.unwrap_or(false) {
            return Ok(EventBinding::OnInit);
        }
        if let Some(raw) = &self.container_event {
            let name_pattern = compile(raw.name_pattern.as_deref().unwrap_or(".*"))?;
            let image_pattern = compile(raw.image_pattern.as_deref().unwrap_or(".*"))?;
            let mut label_patterns = HashMap::new();
            for (key, pattern) in &raw.label_patterns {
                label_patterns.insert(key.clone(), compile(pattern)?);
            }
            let throttle_ms = raw.throttle_ms.unwrap_or(0).max(0) as u64;
            return Ok(EventBinding::ContainerEvent {
                connection: raw.connection.clone(),
                name_pattern,
                image_pattern,
                actions: raw.actions.clone(),
                label_patterns,
                error_limit: raw.error_limit.unwrap_or(0),
                error_policy: raw.error_policy.unwrap_or(ErrorPolicy::Reconnect),
                throttle: Duration::from_millis(throttle_ms),
            });
        }
        if let Some(raw) = &self.log_file {
            let path = raw
                .path
                .clone()
                .ok_or_else(|| "logFile binding requires a path".to_string())?;
            let regex = compile(raw.regex.as_deref().unwrap_or("."))?;
            return Ok(EventBinding::LogFile {
                path,
                line_delimiter: raw.line_delimiter.clone().unwrap_or_else(|| "\n".to_string()),
                regex,
                poll_interval: Duration::from_millis(raw.poll_interval_ms.unwrap_or(1000)),
            });
        }
        if let Some(name) = &self.web_event {
            return Ok(EventBinding::WebEvent { name: name.clone() });
        }

        unreachable!("active arm count checked above")
    }
}

fn compile(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("invalid regex {pattern:?}: {e}"))
}

impl EventBinding {
    /// Promotes `@reboot` crontab shorthand to an `OnInit` binding at
    /// catalog-load time, per the cron spec's documented shorthand.
    pub fn promote_reboot(self) -> Self {
        match &self {
            EventBinding::Cron { spec } if spec.trim() == "@reboot" => EventBinding::OnInit,
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_arm_is_required() {
        let raw = EventBindingRaw {
            interval: Some(10),
            on_init: Some(true),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn zero_arms_is_an_error() {
        assert!(EventBindingRaw::default().validate().is_err());
    }

    #[test]
    fn cron_spec_is_carried_through() {
        let raw = EventBindingRaw {
            cron: Some("* * * * *".to_string()),
            ..Default::default()
        };
        let binding = raw.validate().unwrap();
        assert!(matches!(binding, EventBinding::Cron { spec } if spec == "* * * * *"));
    }

    #[test]
    fn reboot_shorthand_promotes_to_on_init() {
        let raw = EventBindingRaw {
            cron: Some("@reboot".to_string()),
            ..Default::default()
        };
        let binding = raw.validate().unwrap().promote_reboot();
        assert!(matches!(binding, EventBinding::OnInit));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let raw = EventBindingRaw {
            interval: Some(0),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }

    #[test]
    fn invalid_regex_in_container_event_is_rejected() {
        let raw = EventBindingRaw {
            container_event: Some(ContainerEventRaw {
                image_pattern: Some("[invalid".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(raw.validate().is_err());
    }
}
