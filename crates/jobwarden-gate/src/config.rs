//! Configuration for the concurrency gate.

use crate::events::GateEvent;
use jobwarden_core::{EventListeners, FnListener};
use std::time::Duration;

/// Configuration for a [`crate::Gate`].
#[derive(Clone)]
pub struct GateConfig {
    /// Fixed number of slots. A job's `concurrency` field, coerced to >= 1.
    pub(crate) capacity: usize,
    /// Maximum time a blocking `acquire` waits for a slot. `None` waits
    /// indefinitely; `try_acquire` never waits regardless of this value.
    pub(crate) max_wait: Option<Duration>,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<GateEvent>,
}

impl GateConfig {
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::new()
    }
}

pub struct GateConfigBuilder {
    capacity: usize,
    max_wait: Option<Duration>,
    name: String,
    event_listeners: EventListeners<GateEvent>,
}

impl GateConfigBuilder {
    pub fn new() -> Self {
        Self {
            capacity: 1,
            max_wait: None,
            name: "gate".to_string(),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the number of slots. Values below 1 are coerced up to 1, since a
    /// job with no concurrency limit configured still runs one at a time.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    pub fn max_wait(mut self, duration: Duration) -> Self {
        self.max_wait = Some(duration);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn on_permitted<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let GateEvent::Permitted { concurrent, .. } = event {
                f(*concurrent);
            }
        }));
        self
    }

    pub fn on_rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let GateEvent::Rejected { capacity, .. } = event {
                f(*capacity);
            }
        }));
        self
    }

    pub fn on_released<F>(mut self, f: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.event_listeners.add(FnListener::new(move |event| {
            if let GateEvent::Released { duration, .. } = event {
                f(*duration);
            }
        }));
        self
    }

    pub fn build(self) -> crate::Gate {
        crate::Gate::new(GateConfig {
            capacity: self.capacity,
            max_wait: self.max_wait,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for GateConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
