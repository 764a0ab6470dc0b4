//! The plain, synchronous per-job signal.

use crate::event::Event;
use parking_lot::Mutex;
use std::sync::Arc;

#[cfg(feature = "metrics")]
use metrics::counter;

pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// A signal listeners can subscribe to and producers can emit on.
/// Implemented by [`Dispatcher`] directly and by
/// [`crate::debounce::Debounced`], so `wrap_debounced` can return either
/// depending on whether debouncing is actually enabled.
pub trait Signal: Send + Sync {
    fn add_listener(&self, listener: Listener);
    fn emit(&self, event: Event);
}

/// A pub/sub signal carrying [`Event`]s to every registered listener.
/// `emit` is synchronous: it returns only after every listener has
/// returned. Listeners that need to do real work are expected to spawn
/// their own task rather than block the producer.
#[derive(Clone)]
pub struct Dispatcher {
    name: String,
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl Dispatcher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_listener<F>(&self, listener: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.lock().push(Arc::new(listener));
    }

    /// Delivers `event` to every listener, in registration order. A
    /// panicking listener is caught so it cannot stop delivery to the
    /// rest, matching the panic-isolation discipline used elsewhere.
    pub fn emit(&self, event: &Event) {
        #[cfg(feature = "metrics")]
        counter!("dispatch_emitted_total", "job" => self.name.clone()).increment(1);

        let listeners = self.listeners.lock().clone();
        for listener in listeners.iter() {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!(job = %self.name, "dispatcher listener panicked");
                #[cfg(not(feature = "tracing"))]
                let _ = &self.name;
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Signal for Dispatcher {
    fn add_listener(&self, listener: Listener) {
        self.listeners.lock().push(listener);
    }

    fn emit(&self, event: Event) {
        Dispatcher::emit(self, &event);
    }
}
