//! `jobwarden`: a container-friendly cron/event job daemon. The root
//! command loads a catalog and runs it until a signal asks it to stop;
//! `parse` converts a crontab file into catalog YAML.

mod config;
mod crontab;
mod logging;
mod webserver;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::{LogConfig, WebserverConfig};
use jobwarden_core::MetricRegistry;
use jobwarden_model::{Catalog, CatalogRaw};
use jobwarden_runtime::{Runtime, RuntimeContext};
use jobwarden_sources::WebEventRegistry;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "jobwarden", about = "Container-friendly cron/event job daemon")]
struct Cli {
    /// Path to the catalog YAML file.
    #[arg(short, long, default_value = "jobwarden.yaml")]
    config: PathBuf,

    /// Enables debug-level logging regardless of LOG_LEVEL.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Converts a crontab file into catalog YAML.
    Parse {
        /// Path to the crontab file to convert.
        crontab_path: PathBuf,

        /// Writes the catalog to this path instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Expects a user-name field between the cron fields and the command.
        #[arg(long)]
        with_user: bool,

        /// Overrides the built-in cron field matcher.
        #[arg(long)]
        matcher: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Command::Parse { crontab_path, output, with_user, matcher }) => {
            run_parse(crontab_path, output.as_deref(), *with_user, matcher.as_deref())
        }
        None => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .expect("failed to build tokio runtime");
            runtime.block_on(run_daemon(&cli.config, cli.verbose))
        }
    };

    if let Err(error) = result {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run_parse(
    crontab_path: &std::path::Path,
    output: Option<&std::path::Path>,
    with_user: bool,
    matcher: Option<&str>,
) -> Result<()> {
    let content = std::fs::read_to_string(crontab_path)
        .with_context(|| format!("reading crontab file {crontab_path:?}"))?;
    let pattern = matcher.unwrap_or(crontab::DEFAULT_MATCHER);

    let converted = crontab::parse(&content, pattern, with_user)
        .with_context(|| format!("parsing crontab file {crontab_path:?}"))?;

    let catalog = CatalogRaw {
        jobs: converted.jobs,
        ..Default::default()
    };
    let yaml = serde_yaml::to_string(&catalog).context("serializing catalog")?;

    match output {
        Some(path) => std::fs::write(path, yaml).with_context(|| format!("writing {path:?}"))?,
        None => print!("{yaml}"),
    }

    Ok(())
}

async fn run_daemon(config_path: &std::path::Path, verbose: bool) -> Result<()> {
    let log_config = LogConfig::from_env();
    let _guards = logging::init(&log_config, verbose);

    let yaml = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading catalog file {config_path:?}"))?;
    let catalog = Catalog::load(&yaml).context("validating catalog")?;

    config::apply_shell_env(&catalog);

    #[cfg(feature = "tracing")]
    tracing::info!(jobs = catalog.jobs.len(), path = %config_path.display(), "catalog loaded");

    let webserver_config = WebserverConfig::resolve(&catalog);
    let metrics_handle = install_metrics_recorder(&webserver_config);

    let metrics = MetricRegistry::new();
    let web_events = Arc::new(WebEventRegistry::new());
    let ctx = RuntimeContext::new(metrics, web_events);
    let cancellation = CancellationToken::new();

    let jobs = catalog.jobs;
    let job_count = jobs.len();
    let runtime = Runtime::spawn(jobs, ctx.clone(), cancellation.clone());
    #[cfg(feature = "tracing")]
    tracing::info!(running = job_count, "runtime started");
    #[cfg(not(feature = "tracing"))]
    let _ = job_count;

    let server_handle = if webserver_config.enabled() {
        let addr = webserver_config.socket_addr().parse().with_context(|| {
            format!("invalid webserver address {:?}", webserver_config.socket_addr())
        })?;
        warn_on_blank_credentials(&webserver_config);
        let auth = webserver_config.basic_auth();
        let state = webserver::WebServerState {
            ctx,
            metrics_handle: metrics_handle.clone(),
        };
        let server_cancellation = cancellation.clone();
        Some(tokio::spawn(async move {
            if let Err(error) = webserver::serve(addr, state, auth, server_cancellation).await {
                #[cfg(feature = "tracing")]
                tracing::error!(%error, "http trigger server exited with an error");
                #[cfg(not(feature = "tracing"))]
                let _ = error;
            }
        }))
    } else {
        None
    };

    wait_for_shutdown_signal().await;
    #[cfg(feature = "tracing")]
    tracing::info!("shutdown signal received, stopping");

    cancellation.cancel();
    runtime.shutdown().await;
    if let Some(handle) = server_handle {
        let _ = handle.await;
    }

    Ok(())
}

fn install_metrics_recorder(webserver_config: &WebserverConfig) -> Option<metrics_exporter_prometheus::PrometheusHandle> {
    if !webserver_config.metrics {
        return None;
    }
    match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(error) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(%error, "failed to install prometheus recorder, /metrics will 404");
            #[cfg(not(feature = "tracing"))]
            let _ = error;
            None
        }
    }
}

fn warn_on_blank_credentials(webserver_config: &WebserverConfig) {
    let has_username = webserver_config.username.as_deref().is_some_and(|s| !s.is_empty());
    let has_password = webserver_config.password.as_deref().is_some_and(|s| !s.is_empty());
    if (has_username || has_password) && webserver_config.basic_auth().is_none() {
        #[cfg(feature = "tracing")]
        tracing::warn!("webserver username/password incomplete, serving unauthenticated");
    }
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
