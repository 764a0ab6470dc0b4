//! Container-engine lifecycle events, subscribed to over the Docker API.

use bollard::system::EventsOptions;
use bollard::Docker;
use futures::StreamExt;
use jobwarden_dispatch::{Attribute, Event, Signal, EMITTER_DOCKER};
use jobwarden_model::event::ErrorPolicy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ContainerEventSource {
    pub job_name: String,
    pub connection: Option<String>,
    pub name_pattern: Regex,
    pub image_pattern: Regex,
    pub actions: Vec<String>,
    pub label_patterns: HashMap<String, Regex>,
    pub error_limit: u32,
    pub error_policy: ErrorPolicy,
    pub throttle: Duration,
}

impl ContainerEventSource {
    /// Connects and re-connects according to `error_policy` until told to
    /// give up or `cancellation` fires.
    pub async fn run(self, signal: Arc<dyn Signal>, cancellation: CancellationToken) {
        loop {
            let keep_going = self.connect_and_listen(&signal, &cancellation).await;
            if !keep_going || cancellation.is_cancelled() {
                return;
            }
        }
    }

    async fn connect_and_listen(
        &self,
        signal: &Arc<dyn Signal>,
        cancellation: &CancellationToken,
    ) -> bool {
        let docker = match &self.connection {
            Some(host) => Docker::connect_with_http(host, 4, bollard::API_DEFAULT_VERSION),
            None => Docker::connect_with_local_defaults(),
        };
        let docker = match docker {
            Ok(docker) => docker,
            Err(_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(job = %self.job_name, error = %_error, "failed to connect to docker");
                return self.should_reconnect();
            }
        };

        let mut stream = docker.events(Some(EventsOptions::<String> {
            since: None,
            until: None,
            filters: HashMap::new(),
        }));

        let mut consecutive_errors: u32 = 0;

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => return false,
                next = stream.next() => {
                    let Some(result) = next else { return self.should_reconnect() };
                    match result {
                        Ok(message) => {
                            consecutive_errors = 0;
                            if self.matches(&message) {
                                signal.emit(to_event(&message));
                                #[cfg(feature = "metrics")]
                                metrics::counter!("docker_events_matched_total", "job" => self.job_name.clone()).increment(1);
                            }
                        }
                        Err(_error) => {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(job = %self.job_name, error = %_error, "received an error from docker");

                            // Throttle unconditionally, even when error_limit == 0
                            // ("never act on errors") — otherwise a persistently
                            // erroring stream busy-loops at 100% CPU.
                            if !self.throttle.is_zero() {
                                tokio::time::sleep(self.throttle).await;
                            }

                            if self.error_limit == 0 {
                                continue;
                            }
                            consecutive_errors += 1;
                            if consecutive_errors >= self.error_limit {
                                return match self.error_policy {
                                    ErrorPolicy::GiveUp => false,
                                    ErrorPolicy::Kill => {
                                        #[cfg(feature = "tracing")]
                                        tracing::error!(job = %self.job_name, "consecutive docker errors exceeded limit, giving up process");
                                        std::process::exit(1);
                                    }
                                    ErrorPolicy::Reconnect => true,
                                };
                            }
                        }
                    }
                }
            }
        }
    }

    fn should_reconnect(&self) -> bool {
        match self.error_policy {
            ErrorPolicy::Reconnect => true,
            ErrorPolicy::GiveUp => false,
            ErrorPolicy::Kill => std::process::exit(1),
        }
    }

    fn matches(&self, message: &bollard::secret::EventMessage) -> bool {
        let Some(actor) = &message.actor else { return false };
        let attributes = actor.attributes.clone().unwrap_or_default();

        if !self.actions.is_empty() {
            let action = message.action.as_deref().unwrap_or("");
            if !self.actions.iter().any(|a| a == action) {
                return false;
            }
        }

        let name = attributes.get("name").map(String::as_str).unwrap_or("");
        if !self.name_pattern.is_match(name) {
            return false;
        }

        let image = attributes.get("image").map(String::as_str).unwrap_or("");
        if !self.image_pattern.is_match(image) {
            return false;
        }

        for (key, pattern) in &self.label_patterns {
            match attributes.get(key) {
                Some(value) if pattern.is_match(value) => {}
                _ => return false,
            }
        }

        true
    }
}

fn to_event(message: &bollard::secret::EventMessage) -> Event {
    let actor = message.actor.clone().unwrap_or_default();
    let attributes: HashMap<String, Attribute> = actor
        .attributes
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, Attribute::Str(v)))
        .collect();

    Event::new(EMITTER_DOCKER)
        .with("action", message.action.clone().unwrap_or_default())
        .with("actor_id", actor.id.unwrap_or_default())
        .with("attributes", Attribute::Map(attributes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ContainerEventSource {
        ContainerEventSource {
            job_name: "job".to_string(),
            connection: None,
            name_pattern: Regex::new("^web-.*").unwrap(),
            image_pattern: Regex::new(".*").unwrap(),
            actions: vec!["die".to_string()],
            label_patterns: HashMap::new(),
            error_limit: 1,
            error_policy: ErrorPolicy::Reconnect,
            throttle: Duration::from_millis(1),
        }
    }

    fn message(action: &str, name: &str) -> bollard::secret::EventMessage {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), name.to_string());
        bollard::secret::EventMessage {
            action: Some(action.to_string()),
            actor: Some(bollard::secret::EventActor {
                id: Some("abc123".to_string()),
                attributes: Some(attributes),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn matches_on_action_and_name_pattern() {
        let source = source();
        assert!(source.matches(&message("die", "web-1")));
        assert!(!source.matches(&message("start", "web-1")));
        assert!(!source.matches(&message("die", "db-1")));
    }

    #[test]
    fn reconnect_policy_says_to_retry() {
        assert!(source().should_reconnect());
    }

    #[test]
    fn give_up_policy_says_to_stop() {
        let mut source = source();
        source.error_policy = ErrorPolicy::GiveUp;
        assert!(!source.should_reconnect());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn wide_open_source() -> ContainerEventSource {
        ContainerEventSource {
            job_name: "job".to_string(),
            connection: None,
            name_pattern: Regex::new(".*").unwrap(),
            image_pattern: Regex::new(".*").unwrap(),
            actions: Vec::new(),
            label_patterns: HashMap::new(),
            error_limit: 1,
            error_policy: ErrorPolicy::Reconnect,
            throttle: Duration::from_millis(1),
        }
    }

    fn message_with(name: &str, image: &str, extra_value: &str) -> bollard::secret::EventMessage {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), name.to_string());
        attributes.insert("image".to_string(), image.to_string());
        attributes.insert("extra".to_string(), extra_value.to_string());
        bollard::secret::EventMessage {
            action: Some("start".to_string()),
            actor: Some(bollard::secret::EventActor {
                id: Some("abc123".to_string()),
                attributes: Some(attributes),
            }),
            ..Default::default()
        }
    }

    proptest! {
        /// Adding an extra label predicate to a binding can only remove
        /// matches, never add one: whatever matches the tightened
        /// binding must also match the loosened one.
        #[test]
        fn an_extra_label_predicate_can_only_reduce_matches(
            name in "[a-z]{1,8}",
            image in "[a-z]{1,8}",
            extra_value in "[a-z]{1,8}",
            extra_pattern in "[a-z]{1,8}",
        ) {
            let loose = wide_open_source();
            let mut tight = wide_open_source();
            tight.label_patterns.insert("extra".to_string(), Regex::new(&format!("^{extra_pattern}$")).unwrap());

            let message = message_with(&name, &image, &extra_value);
            if tight.matches(&message) {
                prop_assert!(loose.matches(&message));
            }
        }
    }
}
