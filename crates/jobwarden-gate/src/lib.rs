//! A fixed-capacity concurrency gate.
//!
//! Each job gets its own gate sized to its `concurrency` setting. The job
//! runtime acquires a permit non-blockingly before spawning a run and lets
//! the permit drop when the run finishes; a saturated gate means the new
//! run is dropped rather than queued, matching how the job runtime bounds
//! per-job fan-out.
//!
//! ```
//! use jobwarden_gate::Gate;
//!
//! # async fn example() {
//! let gate = Gate::builder().capacity(2).name("example").build();
//!
//! let permit = gate.try_acquire().expect("capacity available");
//! assert_eq!(gate.available(), 1);
//! drop(permit);
//! assert_eq!(gate.available(), 2);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod gate;

pub use config::{GateConfig, GateConfigBuilder};
pub use error::{GateError, Result};
pub use events::GateEvent;
pub use gate::{Gate, GatePermit};
