//! Runs the command inside an already-running container, via a Docker
//! exec session.

use crate::error::ConnectionError;
use crate::request::{ExecOutput, ExecRequest};
use crate::shell::resolve_shell;
use crate::Connection;
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::Docker;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

pub struct ContainerAttachConnection {
    pub container_name: String,
    pub connection: Option<String>,
}

impl Connection for ContainerAttachConnection {
    async fn run(&self, request: &ExecRequest, cancellation: &CancellationToken) -> Result<ExecOutput, ConnectionError> {
        let docker = connect(self.connection.as_deref())?;

        let (shell, shell_args) = resolve_shell(&request.env);
        let mut cmd = vec![shell];
        cmd.extend(shell_args);
        cmd.push(request.command.clone());

        let env: Vec<String> = request.env.iter().map(|(k, v)| format!("{k}={v}")).collect();

        let exec = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
            result = docker.create_exec(
                &self.container_name,
                CreateExecOptions {
                    cmd: Some(cmd),
                    env: Some(env),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    working_dir: request.working_dir.clone(),
                    user: request.user.clone(),
                    ..Default::default()
                },
            ) => result.map_err(ConnectionError::Docker)?,
        };

        let mut combined = Vec::new();
        let start_result = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
            result = docker.start_exec(&exec.id, None) => result.map_err(ConnectionError::Docker)?,
        };

        match start_result {
            StartExecResults::Attached { mut output, .. } => loop {
                tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
                    chunk = output.next() => match chunk {
                        Some(chunk) => combined.extend_from_slice(chunk.map_err(ConnectionError::Docker)?.into_bytes().as_ref()),
                        None => break,
                    },
                }
            },
            StartExecResults::Detached => {}
        }

        Ok(ExecOutput { combined_output: combined })
    }
}

pub(crate) fn connect(host: Option<&str>) -> Result<Docker, ConnectionError> {
    match host {
        Some(host) => Docker::connect_with_http(host, 120, bollard::API_DEFAULT_VERSION),
        None => Docker::connect_with_local_defaults(),
    }
    .map_err(ConnectionError::Docker)
}
