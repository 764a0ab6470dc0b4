//! A broad taxonomy of failure kinds. Every component categorizes its
//! failures into one of these kinds so the job runtime and process
//! bootstrap can apply a uniform propagation policy without having to know
//! about each component's concrete error type.

use std::fmt;

/// Broad classification of a failure, used to decide propagation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Catalog failed validation. Fatal at startup.
    ConfigInvalid,
    /// An event source was lost and its error policy is `kill`.
    SourceFatal,
    /// An event source was lost and its error policy is `giveUp`.
    SourceGiveUp,
    /// An event source hit a transient error below its error limit.
    SourceTransient,
    /// A single task attempt failed; feeds into the retry layer.
    AttemptFailure,
    /// A hook task failed. Logged, never propagated to the parent outcome.
    HookFailure,
    /// An attempt panicked; caught and treated as a non-retryable failure.
    Panic,
}

impl ErrorKind {
    /// Whether this kind should terminate the whole process.
    pub fn is_process_fatal(self) -> bool {
        matches!(self, ErrorKind::ConfigInvalid | ErrorKind::SourceFatal)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::SourceFatal => "source_fatal",
            ErrorKind::SourceGiveUp => "source_give_up",
            ErrorKind::SourceTransient => "source_transient",
            ErrorKind::AttemptFailure => "attempt_failure",
            ErrorKind::HookFailure => "hook_failure",
            ErrorKind::Panic => "panic",
        };
        f.write_str(s)
    }
}
