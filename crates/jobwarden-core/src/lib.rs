//! Shared infrastructure used across jobwarden crates: a process-global
//! metric registry, the error-kind taxonomy from which every component's
//! errors are categorized, and a panic-isolation helper for task attempts.

pub mod error;
pub mod metrics;
pub mod observability;
pub mod panic_guard;

pub use error::ErrorKind;
pub use metrics::MetricRegistry;
pub use observability::{EventListener, EventListeners, FnListener, ObservableEvent};
pub use panic_guard::{guard_panic, into_guard_result, spawn_guarded, PanicGuardError};
