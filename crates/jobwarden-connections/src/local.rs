//! Runs the command directly on the host, via the resolved shell.

use crate::error::ConnectionError;
use crate::request::{ExecOutput, ExecRequest};
use crate::shell::resolve_shell;
use crate::Connection;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

pub struct LocalConnection;

impl Connection for LocalConnection {
    async fn run(&self, request: &ExecRequest, cancellation: &CancellationToken) -> Result<ExecOutput, ConnectionError> {
        let (shell, shell_args) = resolve_shell(&request.env);

        let mut cmd = Command::new(&shell);
        cmd.args(&shell_args);
        cmd.arg(&request.command);
        cmd.envs(&request.env);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Without this, dropping the child (on attempt timeout/cancellation)
        // only detaches the handle — the process keeps running untracked.
        cmd.kill_on_drop(true);

        if let Some(dir) = &request.working_dir {
            cmd.current_dir(dir);
        }
        crate::credential::apply(&mut cmd, request.user.as_deref(), request.group.as_deref())?;

        let child = cmd.spawn().map_err(ConnectionError::Spawn)?;

        // `kill_on_drop` means losing the race below (the `wait_with_output`
        // future, and the child it owns, simply gets dropped) is enough to
        // kill the process — no separate `start_kill` call needed.
        let output = tokio::select! {
            biased;
            _ = cancellation.cancelled() => return Err(ConnectionError::Cancelled),
            result = child.wait_with_output() => result.map_err(ConnectionError::Wait)?,
        };

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if !output.status.success() {
            return Err(ConnectionError::NonZeroExit {
                status: output.status.code().unwrap_or(-1),
                output: combined,
            });
        }
        Ok(ExecOutput { combined_output: combined })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_cancellation() -> CancellationToken {
        CancellationToken::new()
    }

    #[tokio::test]
    async fn runs_a_simple_command_and_captures_stdout() {
        let request = ExecRequest {
            command: "echo hello".to_string(),
            env: HashMap::new(),
            working_dir: None,
            user: None,
            group: None,
        };
        let output = LocalConnection.run(&request, &no_cancellation()).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.combined_output).trim(), "hello");
    }

    #[tokio::test]
    async fn shell_args_can_be_overridden_via_env() {
        let mut env = HashMap::new();
        env.insert("SHELL".to_string(), "/bin/sh".to_string());
        env.insert("SHELL_ARGS".to_string(), "-c".to_string());
        let request = ExecRequest {
            command: "echo $FOO".to_string(),
            env: {
                let mut e = env.clone();
                e.insert("FOO".to_string(), "bar".to_string());
                e
            },
            working_dir: None,
            user: None,
            group: None,
        };
        let output = LocalConnection.run(&request, &no_cancellation()).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&output.combined_output).trim(), "bar");
    }

    #[tokio::test]
    async fn a_non_zero_exit_is_an_error() {
        let request = ExecRequest {
            command: "exit 3".to_string(),
            env: HashMap::new(),
            working_dir: None,
            user: None,
            group: None,
        };
        let err = LocalConnection.run(&request, &no_cancellation()).await.unwrap_err();
        assert!(matches!(err, ConnectionError::NonZeroExit { status: 3, .. }));
    }

    #[tokio::test]
    async fn a_cancelled_token_aborts_a_running_command() {
        let request = ExecRequest {
            command: "sleep 5".to_string(),
            env: HashMap::new(),
            working_dir: None,
            user: None,
            group: None,
        };
        let cancellation = CancellationToken::new();
        cancellation.cancel();
        let err = LocalConnection.run(&request, &cancellation).await.unwrap_err();
        assert!(matches!(err, ConnectionError::Cancelled));
    }
}
