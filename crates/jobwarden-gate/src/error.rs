//! Error type for the concurrency gate.

/// Errors that can occur when acquiring a gate permit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    /// The gate rejected the call because it's at capacity.
    #[error("gate is full: capacity ({capacity}) reached")]
    Full { capacity: usize },
    /// Timeout waiting for a permit.
    #[error("timeout waiting for a gate permit")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, GateError>;
