//! The `Event` value a source posts and a job's listener receives.

use crate::attribute::Attribute;
use std::collections::HashMap;

/// Which event source produced an [`Event`].
pub const EMITTER_CRON: &str = "cron";
pub const EMITTER_INTERVAL: &str = "interval";
pub const EMITTER_INIT: &str = "init";
pub const EMITTER_DOCKER: &str = "docker";
pub const EMITTER_LOG_FILE: &str = "log-file";
pub const EMITTER_WEB: &str = "web";

/// An event carried from a source, through the dispatcher, to every
/// listening job. Ephemeral: discarded once every listener has returned
/// (or once a debounce window elapses without a newer event).
#[derive(Debug, Clone)]
pub struct Event {
    pub emitter: &'static str,
    pub attributes: HashMap<String, Attribute>,
}

impl Event {
    pub fn new(emitter: &'static str) -> Self {
        let mut attributes = HashMap::new();
        attributes.insert("emitter".to_string(), Attribute::Str(emitter.to_string()));
        Self { emitter, attributes }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Attribute>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// A var table view of the attributes, suitable for template expansion.
    pub fn as_vars(&self) -> HashMap<String, jobwarden_template::Value> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.clone(), jobwarden_template::Value::from(v)))
            .collect()
    }
}
