//! Command connections: the backends a task's command runs under. Every
//! backend follows the same prepare/connect/execute/disconnect lifecycle
//! so the action layer can treat them uniformly.

pub mod create;
pub mod credential;
pub mod attach;
pub mod error;
pub mod local;
pub mod request;
pub mod shell;

pub use error::ConnectionError;
pub use request::{ExecOutput, ExecRequest};

use jobwarden_model::Connection as ConnectionSpec;
use tokio_util::sync::CancellationToken;

/// A connection backend: local shell, an already-running container, or a
/// freshly created one. `run` owns the full lifecycle for a single
/// attempt — there is no cross-attempt connection reuse. `cancellation`
/// is raced against the in-flight work (subprocess wait, HTTP/exec
/// stream) so a global shutdown aborts the connection instead of merely
/// detaching from it.
#[allow(async_fn_in_trait)]
pub trait Connection {
    async fn run(&self, request: &ExecRequest, cancellation: &CancellationToken) -> Result<ExecOutput, ConnectionError>;
}

/// Dispatches to the connection backend `spec` resolves to.
pub async fn run(
    spec: &ConnectionSpec,
    request: &ExecRequest,
    cancellation: &CancellationToken,
) -> Result<ExecOutput, ConnectionError> {
    match spec {
        ConnectionSpec::Local => local::LocalConnection.run(request, cancellation).await,
        ConnectionSpec::ContainerAttach { container_name, connection } => {
            attach::ContainerAttachConnection {
                container_name: container_name.clone(),
                connection: connection.clone(),
            }
            .run(request, cancellation)
            .await
        }
        ConnectionSpec::ContainerCreate {
            image,
            container_name,
            connection,
            volumes,
            networks,
        } => {
            create::ContainerCreateConnection {
                image: image.clone(),
                container_name: container_name.clone(),
                connection: connection.clone(),
                volumes: volumes.clone(),
                networks: networks.clone(),
            }
            .run(request, cancellation)
            .await
        }
    }
}
