//! A thin, idempotent wrapper over the `metrics` crate's global recorder.
//! The first call to [`MetricRegistry::inc_counter`] for a given name
//! registers the counter (and its help text) and fixes the label key set;
//! every subsequent call with the same name must use the same set of label
//! keys, or it is treated as a programming error: fail loud in debug
//! builds and simply skip the bad increment in release, since a
//! mislabeled counter is a code defect, not an operational one.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::error;

/// Fixed prefix every counter registered through this registry is namespaced under.
pub const METRIC_PREFIX: &str = "jobwarden";

#[derive(Default)]
struct Registered {
    /// Label keys this counter was first registered with, sorted for
    /// order-independent comparison.
    label_keys: Vec<String>,
}

/// Process-global metric registry.
///
/// Cheap to clone: internally an `Arc<Mutex<...>>`, shared across spawned
/// tasks the same way other per-instance state in this workspace is.
#[derive(Clone)]
pub struct MetricRegistry {
    inner: Arc<Mutex<HashMap<String, Registered>>>,
}

impl MetricRegistry {
    /// Creates a fresh, empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Increments the named counter, registering it (and describing it with
    /// `help`) on first use. `labels` is an ordered list of `(key, value)`
    /// pairs; the *set* of keys must be identical across calls for the same
    /// `name`.
    pub fn inc_counter(&self, name: &str, help: &str, labels: &[(&str, &str)]) {
        self.inc_counter_by(name, help, labels, 1)
    }

    /// As [`Self::inc_counter`] but with an explicit increment amount.
    pub fn inc_counter_by(&self, name: &str, help: &str, labels: &[(&str, &str)], amount: u64) {
        let mut keys: Vec<String> = labels.iter().map(|(k, _)| (*k).to_string()).collect();
        keys.sort();

        {
            let mut registry = self.inner.lock();
            match registry.get(name) {
                Some(existing) => {
                    if existing.label_keys != keys {
                        #[cfg(feature = "tracing")]
                        error!(
                            metric = name,
                            expected = ?existing.label_keys,
                            got = ?keys,
                            "metric registered with mismatched label keys"
                        );
                        debug_assert!(
                            false,
                            "metric `{name}` registered with mismatched label keys: expected {:?}, got {:?}",
                            existing.label_keys, keys
                        );
                        return;
                    }
                }
                None => {
                    registry.insert(name.to_string(), Registered { label_keys: keys });
                    self.describe(name, help);
                }
            }
        }

        self.record(name, labels, amount);
    }

    #[cfg(feature = "metrics")]
    fn describe(&self, name: &str, help: &str) {
        let full_name = format!("{METRIC_PREFIX}_{name}");
        metrics::describe_counter!(full_name, help.to_string());
    }

    #[cfg(not(feature = "metrics"))]
    fn describe(&self, _name: &str, _help: &str) {}

    #[cfg(feature = "metrics")]
    fn record(&self, name: &str, labels: &[(&str, &str)], amount: u64) {
        let full_name = format!("{METRIC_PREFIX}_{name}");
        let owned_labels: Vec<metrics::Label> = labels
            .iter()
            .map(|(k, v)| metrics::Label::new(k.to_string(), v.to_string()))
            .collect();
        let key = metrics::Key::from_parts(full_name, owned_labels);
        metrics::counter(key).increment(amount);
    }

    #[cfg(not(feature = "metrics"))]
    fn record(&self, _name: &str, _labels: &[(&str, &str)], _amount: u64) {}
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_registration_fixes_label_keys() {
        let registry = MetricRegistry::new();
        registry.inc_counter("dispatched_total", "help", &[("job", "a")]);
        registry.inc_counter("dispatched_total", "help", &[("job", "b")]);

        let inner = registry.inner.lock();
        assert_eq!(inner.get("dispatched_total").unwrap().label_keys, vec!["job"]);
    }

    #[test]
    fn distinct_counters_track_independently() {
        let registry = MetricRegistry::new();
        registry.inc_counter("a", "help a", &[]);
        registry.inc_counter("b", "help b", &[("x", "1")]);

        let inner = registry.inner.lock();
        assert!(inner.contains_key("a"));
        assert!(inner.contains_key("b"));
    }

    #[test]
    fn clone_shares_state() {
        let registry = MetricRegistry::new();
        let clone = registry.clone();
        clone.inc_counter("shared", "help", &[]);

        assert!(registry.inner.lock().contains_key("shared"));
    }
}
