//! Trailing-edge debounce wrapper over a [`Dispatcher`].

use crate::dispatcher::{Dispatcher, Listener, Signal};
use crate::event::Event;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Wraps `inner` in a debouncer: each `emit` (re)starts a `delay` timer,
/// and only the most recent event survives a burst to reach `inner`.
pub struct Debounced {
    inner: Dispatcher,
    delay: Duration,
    generation: Arc<AtomicU64>,
    latest: Arc<Mutex<Option<Event>>>,
}

impl Debounced {
    fn new(inner: Dispatcher, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            generation: Arc::new(AtomicU64::new(0)),
            latest: Arc::new(Mutex::new(None)),
        }
    }
}

impl Signal for Debounced {
    fn add_listener(&self, listener: Listener) {
        Signal::add_listener(&self.inner, listener);
    }

    /// Stores `event` as the latest pending one and spawns a timer task.
    /// When the timer fires, it forwards the event to `inner` only if no
    /// newer `emit` has arrived in the meantime (trailing edge).
    fn emit(&self, event: Event) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.latest.lock() = Some(event);

        let inner = self.inner.clone();
        let delay = self.delay;
        let gen_counter = Arc::clone(&self.generation);
        let latest = Arc::clone(&self.latest);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if gen_counter.load(Ordering::SeqCst) == generation {
                if let Some(event) = latest.lock().take() {
                    inner.emit(&event);
                }
            }
        });
    }
}

/// Returns a boxed [`Signal`]: `inner` directly when debouncing is
/// disabled (`None`) or zero, a [`Debounced`] wrapper otherwise.
pub fn wrap_debounced(inner: Dispatcher, debounce: Option<Duration>) -> Arc<dyn Signal> {
    match debounce {
        None => Arc::new(inner),
        Some(d) if d.is_zero() => Arc::new(inner),
        Some(d) => Arc::new(Debounced::new(inner, d)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EMITTER_WEB;

    #[tokio::test(start_paused = true)]
    async fn only_the_last_event_in_a_burst_is_forwarded() {
        let inner = Dispatcher::new("job");
        let received = Arc::new(Mutex::new(Vec::new()));
        let r = Arc::clone(&received);
        inner.add_listener(move |event| {
            r.lock().push(event.attributes.get("n").cloned());
        });

        let debounced = wrap_debounced(inner, Some(Duration::from_millis(200)));

        for n in 0..3 {
            debounced.emit(Event::new(EMITTER_WEB).with("n", (n as f64).to_string()));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(received.lock().len(), 1);
    }

    #[tokio::test]
    async fn zero_debounce_forwards_synchronously() {
        let inner = Dispatcher::new("job");
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        inner.add_listener(move |_| *c.lock() += 1);

        let wrapped = wrap_debounced(inner, Some(Duration::ZERO));
        wrapped.emit(Event::new(EMITTER_WEB));
        assert_eq!(*count.lock(), 1);
    }

    #[tokio::test]
    async fn disabled_debounce_forwards_synchronously() {
        let inner = Dispatcher::new("job");
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        inner.add_listener(move |_| *c.lock() += 1);

        let wrapped = wrap_debounced(inner, None);
        wrapped.emit(Event::new(EMITTER_WEB));
        assert_eq!(*count.lock(), 1);
    }
}
