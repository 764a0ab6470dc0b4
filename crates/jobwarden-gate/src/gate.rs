//! The gate itself: a fixed-capacity slot pool backed by a semaphore.

use crate::config::GateConfig;
use crate::error::GateError;
use crate::events::GateEvent;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Bounds how many callers may hold a permit at once. Unlike a `Bulkhead`
/// layered over a `tower::Service`, a `Gate` has no inner service to call —
/// the caller acquires a permit, does its own work, and drops the permit
/// (or lets it drop) when done. Permits are owned rather than borrowed so
/// the job runtime can move one into a spawned task: acquire a slot, spawn
/// the run, release the slot when the task finishes.
#[derive(Clone)]
pub struct Gate {
    semaphore: Arc<Semaphore>,
    config: Arc<GateConfig>,
}

impl Gate {
    pub fn builder() -> crate::GateConfigBuilder {
        crate::GateConfigBuilder::new()
    }

    pub(crate) fn new(config: GateConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.capacity)),
            config: Arc::new(config),
        }
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Number of slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Acquires a slot, waiting up to `max_wait` (or indefinitely if unset).
    pub async fn acquire(&self) -> Result<GatePermit, GateError> {
        let permit = match self.config.max_wait {
            Some(duration) => {
                tokio::time::timeout(duration, Arc::clone(&self.semaphore).acquire_owned())
                    .await
                    .map_err(|_| GateError::Timeout)?
                    .expect("gate semaphore is never closed")
            }
            None => Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .expect("gate semaphore is never closed"),
        };
        Ok(self.permitted(permit))
    }

    /// Acquires a slot only if one is immediately available. Used by the job
    /// runtime, which drops a dispatched run rather than queuing it behind a
    /// saturated gate.
    pub fn try_acquire(&self) -> Result<GatePermit, GateError> {
        match Arc::clone(&self.semaphore).try_acquire_owned() {
            Ok(permit) => Ok(self.permitted(permit)),
            Err(_) => {
                self.config.event_listeners.emit(&GateEvent::Rejected {
                    source: self.config.name.clone(),
                    timestamp: Instant::now(),
                    capacity: self.config.capacity,
                });

                #[cfg(feature = "metrics")]
                counter!("gate_rejected_total", "gate" => self.config.name.clone()).increment(1);

                Err(GateError::Full {
                    capacity: self.config.capacity,
                })
            }
        }
    }

    fn permitted(&self, permit: OwnedSemaphorePermit) -> GatePermit {
        let concurrent = self.config.capacity - self.semaphore.available_permits();
        self.config.event_listeners.emit(&GateEvent::Permitted {
            source: self.config.name.clone(),
            timestamp: Instant::now(),
            concurrent,
        });

        #[cfg(feature = "metrics")]
        {
            counter!("gate_permitted_total", "gate" => self.config.name.clone()).increment(1);
            gauge!("gate_concurrent", "gate" => self.config.name.clone()).set(concurrent as f64);
        }

        GatePermit {
            _permit: permit,
            config: Arc::clone(&self.config),
            started: Instant::now(),
        }
    }
}

/// An acquired slot. Releases the slot and emits [`GateEvent::Released`] on
/// drop, whether the held work succeeded or failed.
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
    config: Arc<GateConfig>,
    started: Instant,
}

impl Drop for GatePermit {
    fn drop(&mut self) {
        let duration = self.started.elapsed();
        self.config.event_listeners.emit(&GateEvent::Released {
            source: self.config.name.clone(),
            timestamp: Instant::now(),
            duration,
        });

        #[cfg(feature = "metrics")]
        counter!("gate_released_total", "gate" => self.config.name.clone()).increment(1);
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// For any capacity `C` and any burst of `N` non-blocking
        /// acquires, exactly `min(C, N)` succeed and the rest are
        /// rejected — the gate never lets more than `C` permits out at
        /// once.
        #[test]
        fn at_most_capacity_permits_are_held_at_a_time(capacity in 1usize..20, burst in 0usize..40) {
            let gate = Gate::builder().capacity(capacity).build();
            let mut held = Vec::new();
            let mut accepted = 0;

            for _ in 0..burst {
                match gate.try_acquire() {
                    Ok(permit) => {
                        held.push(permit);
                        accepted += 1;
                    }
                    Err(_) => {}
                }
            }

            prop_assert_eq!(accepted, capacity.min(burst));
            prop_assert_eq!(held.len(), capacity.min(burst));

            let released = held.len() / 2;
            held.truncate(held.len() - released);
            prop_assert_eq!(gate.available(), capacity - held.len());
        }
    }
}
