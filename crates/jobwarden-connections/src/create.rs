//! Creates a fresh container per attempt, runs the command in it, and
//! force-removes it afterward regardless of outcome.

use crate::attach::connect;
use crate::error::ConnectionError;
use crate::request::{ExecOutput, ExecRequest};
use crate::shell::resolve_shell;
use crate::Connection;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions, StatsOptions,
};
use bollard::secret::{EndpointSettings, HostConfig, NetworkingConfig};
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct ContainerCreateConnection {
    pub image: String,
    pub container_name: Option<String>,
    pub connection: Option<String>,
    pub volumes: Vec<String>,
    pub networks: Vec<String>,
}

impl Connection for ContainerCreateConnection {
    async fn run(&self, request: &ExecRequest, cancellation: &CancellationToken) -> Result<ExecOutput, ConnectionError> {
        let docker = connect(self.connection.as_deref())?;

        let (shell, shell_args) = resolve_shell(&request.env);
        let mut cmd = vec![shell];
        cmd.extend(shell_args);
        cmd.push(request.command.clone());

        let env: Vec<String> = request.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let volume_keys = in_container_paths(&self.volumes)?;

        let endpoints_config: HashMap<String, EndpointSettings> = self
            .networks
            .iter()
            .map(|name| (name.clone(), EndpointSettings::default()))
            .collect();

        let config = Config {
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            env: Some(env),
            working_dir: request.working_dir.clone(),
            user: request.user.clone(),
            cmd: Some(cmd),
            // Clears any image-baked entrypoint so `cmd` (the resolved
            // shell invocation) is what actually runs.
            entrypoint: Some(Vec::new()),
            image: Some(self.image.clone()),
            volumes: Some(volume_keys.into_iter().map(|v| (v, HashMap::new())).collect()),
            host_config: Some(HostConfig {
                binds: Some(self.volumes.clone()),
                ..Default::default()
            }),
            networking_config: Some(NetworkingConfig { endpoints_config }),
            ..Default::default()
        };

        let options = self.container_name.as_deref().map(|name| CreateContainerOptions {
            name: name.to_string(),
            platform: None,
        });

        let created = docker
            .create_container(options, config)
            .await
            .map_err(ConnectionError::Docker)?;

        let result = self.run_in(&docker, &created.id, cancellation).await;

        let _ = docker
            .remove_container(
                &created.id,
                Some(RemoveContainerOptions { force: true, ..Default::default() }),
            )
            .await;

        result
    }
}

impl ContainerCreateConnection {
    async fn run_in(&self, docker: &Docker, id: &str, cancellation: &CancellationToken) -> Result<ExecOutput, ConnectionError> {
        retry_until_ready(Duration::from_millis(200), 30, cancellation, || async {
            docker.start_container(id, None::<StartContainerOptions>).await.map_err(ConnectionError::Docker)
        })
        .await?;

        // Readiness probe: a stats fetch succeeds once the container is
        // actually running. `stream: false` takes exactly one sample
        // instead of the (unbounded) live stream.
        retry_until_ready(Duration::from_millis(200), 30, cancellation, || async {
            match docker.stats(id, Some(StatsOptions { stream: false, one_shot: true })).next().await {
                Some(Ok(_)) => Ok(()),
                Some(Err(error)) => Err(ConnectionError::Docker(error)),
                None => Err(ConnectionError::NotReady),
            }
        })
        .await?;

        let mut stream = docker.logs(
            id,
            Some(LogsOptions::<String> {
                stdout: true,
                stderr: true,
                follow: false,
                ..Default::default()
            }),
        );

        let mut combined = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
                chunk = stream.next() => match chunk {
                    Some(chunk) => combined.extend_from_slice(chunk.map_err(ConnectionError::Docker)?.into_bytes().as_ref()),
                    None => break,
                },
            }
        }

        Ok(ExecOutput { combined_output: combined })
    }
}

/// Polls `f` up to `max_attempts` times, `delay` apart, returning on the
/// first success, or as soon as `cancellation` fires. Still bounds what
/// the original's context-scoped retry loop leaves open-ended (a container
/// attempt has no caller-supplied deadline of its own), but a global
/// shutdown now interrupts the wait instead of running it out.
async fn retry_until_ready<F, Fut>(
    delay: Duration,
    max_attempts: u32,
    cancellation: &CancellationToken,
    mut f: F,
) -> Result<(), ConnectionError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), ConnectionError>>,
{
    let mut last_error = None;
    for _ in 0..max_attempts {
        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
            result = f() => match result {
                Ok(()) => return Ok(()),
                Err(error) => last_error = Some(error),
            },
        }

        tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
    Err(last_error.expect("max_attempts > 0"))
}

fn in_container_paths(volumes: &[String]) -> Result<Vec<String>, ConnectionError> {
    volumes
        .iter()
        .map(|spec| {
            let parts = crate::shell::escaped_split(spec, ':');
            parts
                .get(1)
                .cloned()
                .ok_or_else(|| ConnectionError::InvalidVolume { spec: spec.clone() })
        })
        .collect()
}
