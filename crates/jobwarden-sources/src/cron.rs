//! Cron-scheduled ticks, driven by the `cron` crate's schedule parser.

use chrono::Utc;
use cron::Schedule;
use jobwarden_dispatch::{Event, Signal, EMITTER_CRON};
use std::str::FromStr;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// Sleeps until each occurrence of `spec` and emits on `signal`, until
/// `cancellation` fires. Returns immediately if `spec` does not parse.
pub async fn run(job_name: &str, spec: &str, signal: Arc<dyn Signal>, cancellation: CancellationToken) {
    let schedule = match Schedule::from_str(spec) {
        Ok(schedule) => schedule,
        Err(_error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(job = %job_name, %spec, error = %_error, "cannot parse cron schedule");
            #[cfg(not(feature = "tracing"))]
            let _ = job_name;
            return;
        }
    };

    loop {
        let now = Utc::now();
        let Some(next) = schedule.after(&now).next() else {
            return;
        };
        let dt = (next - now).to_std().unwrap_or_default();

        tokio::select! {
            _ = sleep(dt) => {}
            _ = cancellation.cancelled() => return,
        }

        signal.emit(Event::new(EMITTER_CRON).with("schedule", spec.to_string()));
    }
}
