//! Observable events emitted by a running retry loop.

use jobwarden_core::ObservableEvent;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed and a retry has been scheduled.
    Retrying {
        source: String,
        attempt: u32,
        delay: Duration,
        timestamp: Instant,
    },
    /// The operation succeeded, possibly after retries.
    Succeeded {
        source: String,
        attempts: u32,
        timestamp: Instant,
    },
    /// Retries were exhausted (attempt budget or deadline); the last error
    /// is being returned to the caller.
    Exhausted {
        source: String,
        attempts: u32,
        timestamp: Instant,
    },
}

impl ObservableEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::Retrying { .. } => "retrying",
            RetryEvent::Succeeded { .. } => "succeeded",
            RetryEvent::Exhausted { .. } => "exhausted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::Retrying { timestamp, .. }
            | RetryEvent::Succeeded { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            RetryEvent::Retrying { source, .. }
            | RetryEvent::Succeeded { source, .. }
            | RetryEvent::Exhausted { source, .. } => source,
        }
    }
}
