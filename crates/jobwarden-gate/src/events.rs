//! Observable events emitted by a [`crate::Gate`].

use jobwarden_core::ObservableEvent;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum GateEvent {
    /// A permit was acquired; `concurrent` is the count including this call.
    Permitted {
        source: String,
        timestamp: Instant,
        concurrent: usize,
    },
    /// A permit was not acquired because the gate was at capacity.
    Rejected {
        source: String,
        timestamp: Instant,
        capacity: usize,
    },
    /// A permit was released after the holder finished.
    Released {
        source: String,
        timestamp: Instant,
        duration: Duration,
    },
}

impl ObservableEvent for GateEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GateEvent::Permitted { .. } => "permitted",
            GateEvent::Rejected { .. } => "rejected",
            GateEvent::Released { .. } => "released",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            GateEvent::Permitted { timestamp, .. }
            | GateEvent::Rejected { timestamp, .. }
            | GateEvent::Released { timestamp, .. } => *timestamp,
        }
    }

    fn source_name(&self) -> &str {
        match self {
            GateEvent::Permitted { source, .. }
            | GateEvent::Rejected { source, .. }
            | GateEvent::Released { source, .. } => source,
        }
    }
}
