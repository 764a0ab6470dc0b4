//! A single tick fired once at startup.

use jobwarden_dispatch::{Event, Signal, EMITTER_INIT};
use std::sync::Arc;

/// Emits once, immediately, and returns. Also backs `@reboot` cron
/// shorthand once promoted by [`jobwarden_model::EventBinding::promote_reboot`].
pub async fn run(signal: Arc<dyn Signal>) {
    signal.emit(Event::new(EMITTER_INIT));
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobwarden_dispatch::Dispatcher;

    #[tokio::test]
    async fn fires_exactly_once() {
        let dispatcher = Dispatcher::new("job");
        let seen = Arc::new(parking_lot::Mutex::new(0));
        let s = Arc::clone(&seen);
        dispatcher.add_listener(move |_| *s.lock() += 1);

        let signal: Arc<dyn Signal> = Arc::new(dispatcher);
        run(signal).await;
        assert_eq!(*seen.lock(), 1);
    }
}
