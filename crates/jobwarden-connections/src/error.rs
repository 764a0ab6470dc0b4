//! Errors a command connection can fail with.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to wait for command: {0}")]
    Wait(#[source] std::io::Error),
    #[error("command exited with non-zero status {status}")]
    NonZeroExit { status: i32, output: Vec<u8> },
    #[error("docker error: {0}")]
    Docker(#[source] bollard::errors::Error),
    #[error("invalid volume spec {spec:?}: expected HOST:CONTAINER")]
    InvalidVolume { spec: String },
    #[error("unknown user {user:?}")]
    UnknownUser { user: String },
    #[error("unknown group {group:?}")]
    UnknownGroup { group: String },
    #[error("switching user requires running as root")]
    RequiresRoot,
    #[error("connection aborted by shutdown")]
    Cancelled,
    #[error("container readiness probe returned no sample")]
    NotReady,
}
