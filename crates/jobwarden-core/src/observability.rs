//! Generic event-listener plumbing shared by every component crate that
//! wants `on_*` builder callbacks (retry, gate, sources, ...).

#[cfg(feature = "tracing")]
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// An event a component emits for observability.
pub trait ObservableEvent: Send + Sync + fmt::Debug {
    /// e.g. "retry", "call_permitted".
    fn event_type(&self) -> &'static str;
    fn timestamp(&self) -> Instant;
    /// Name of the emitting instance (job name, task name, ...).
    fn source_name(&self) -> &str;
}

pub trait EventListener<E: ObservableEvent>: Send + Sync {
    fn on_event(&self, event: &E);
}

pub type BoxedEventListener<E> = Arc<dyn EventListener<E>>;

/// A collection of listeners for one event type, shared (cheaply cloned)
/// between the component's config and every spawned attempt.
#[derive(Clone)]
pub struct EventListeners<E: ObservableEvent> {
    listeners: Vec<BoxedEventListener<E>>,
}

impl<E: ObservableEvent> EventListeners<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn add<L>(&mut self, listener: L)
    where
        L: EventListener<E> + 'static,
    {
        self.listeners.push(Arc::new(listener));
    }

    /// Emits to every listener. A panicking listener is caught so it cannot
    /// prevent other listeners (or the calling task) from proceeding.
    pub fn emit(&self, event: &E) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                listener.on_event(event);
            }));

            if let Err(_payload) = result {
                #[cfg(feature = "tracing")]
                log_listener_panic(index, event, _payload.as_ref());
                #[cfg(not(feature = "tracing"))]
                let _ = index;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E: ObservableEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<E>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: ObservableEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}

#[cfg(feature = "tracing")]
fn log_listener_panic<E: ObservableEvent>(
    index: usize,
    event: &E,
    panic_payload: &(dyn Any + Send),
) {
    let message = panic_payload
        .downcast_ref::<&'static str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic_payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    tracing::warn!(
        listener_index = index,
        source = event.source_name(),
        event_type = event.event_type(),
        panic_message = %message,
        "event listener panicked"
    );
}
