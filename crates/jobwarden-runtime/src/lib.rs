//! The job runtime: per-job wiring of a dispatcher, concurrency gate,
//! task fan-out and job-level hooks, plus every event source bound to the
//! job. `Runtime` owns one `JobRuntime` per enabled job in a catalog.

pub mod context;
pub mod job;
pub mod runtime;

pub use context::RuntimeContext;
pub use job::JobRuntime;
pub use runtime::Runtime;
