//! Process-wide handles every job shares: the metric registry and the
//! web-event trigger registry.

use jobwarden_core::MetricRegistry;
use jobwarden_sources::WebEventRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct RuntimeContext {
    pub metrics: MetricRegistry,
    pub web_events: Arc<WebEventRegistry>,
}

impl RuntimeContext {
    pub fn new(metrics: MetricRegistry, web_events: Arc<WebEventRegistry>) -> Self {
        Self { metrics, web_events }
    }
}
