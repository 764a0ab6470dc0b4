//! Per-job event pub/sub: an [`Event`] posted by a source reaches every
//! listener registered on that job's [`Dispatcher`], optionally passing
//! through a trailing-edge debounce window first.

pub mod attribute;
pub mod debounce;
pub mod dispatcher;
pub mod event;

pub use attribute::Attribute;
pub use debounce::{wrap_debounced, Debounced};
pub use dispatcher::{Dispatcher, Listener, Signal};
pub use event::{
    Event, EMITTER_CRON, EMITTER_DOCKER, EMITTER_INIT, EMITTER_INTERVAL, EMITTER_LOG_FILE,
    EMITTER_WEB,
};
