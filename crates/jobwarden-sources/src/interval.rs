//! Fixed-period ticks.

use chrono::Utc;
use jobwarden_dispatch::{Event, Signal, EMITTER_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Emits on `signal` every `period`, until `cancellation` fires. The first
/// tick fires after one `period`, matching a `time.Ticker`'s behavior.
pub async fn run(period: Duration, signal: Arc<dyn Signal>, cancellation: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // first tick fires immediately; discard it

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = cancellation.cancelled() => return,
        }

        signal.emit(
            Event::new(EMITTER_INTERVAL)
                .with("interval_ms", period.as_millis().to_string())
                .with("time", Utc::now().to_rfc3339()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_dispatch::Dispatcher;

    #[tokio::test(start_paused = true)]
    async fn ticks_repeatedly_until_cancelled() {
        let dispatcher = Dispatcher::new("job");
        let seen = Arc::new(parking_lot::Mutex::new(0));
        let s = Arc::clone(&seen);
        dispatcher.add_listener(move |_| *s.lock() += 1);

        let signal: Arc<dyn Signal> = Arc::new(dispatcher);
        let token = CancellationToken::new();

        let handle = tokio::spawn(run(Duration::from_millis(10), signal, token.clone()));
        tokio::time::sleep(Duration::from_millis(55)).await;
        token.cancel();
        let _ = handle.await;
        assert!(*seen.lock() >= 4);
    }
}
