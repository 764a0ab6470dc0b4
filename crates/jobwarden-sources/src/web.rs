//! Process-wide registry for web-triggered events: the HTTP trigger
//! server (built in the `jobwarden` binary) calls [`WebEventRegistry::trigger`]
//! by name; every job bound to that name receives the event.

use jobwarden_dispatch::{Attribute, Event, Signal, EMITTER_WEB};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct WebEventRegistry {
    listeners: Mutex<HashMap<String, Vec<Arc<dyn Signal>>>>,
}

impl WebEventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `signal` to fire whenever `name` is triggered.
    pub fn register(&self, name: impl Into<String>, signal: Arc<dyn Signal>) {
        self.listeners.lock().entry(name.into()).or_default().push(signal);
    }

    /// Fires every signal bound to `name`, attaching `params` to the event.
    /// Returns the number of listeners notified.
    pub fn trigger(&self, name: &str, params: HashMap<String, Attribute>) -> usize {
        let listeners = self.listeners.lock();
        let Some(bound) = listeners.get(name) else {
            return 0;
        };

        let event = Event::new(EMITTER_WEB)
            .with("event", name.to_string())
            .with("params", Attribute::Map(params));

        for signal in bound {
            signal.emit(event.clone());
        }
        bound.len()
    }
}
