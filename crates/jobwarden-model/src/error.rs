//! Validation errors for the job catalog.

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("parse catalog: {0}")]
    Parse(String),

    #[error("job {job:?}: {reason}")]
    InvalidJob { job: String, reason: String },

    #[error("job {job:?} event binding #{index}: {reason}")]
    InvalidEventBinding {
        job: String,
        index: usize,
        reason: String,
    },

    #[error("job {job:?} task #{index}: {reason}")]
    InvalidTask {
        job: String,
        index: usize,
        reason: String,
    },

    #[error("invalid regex {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
