//! Tracing subscriber wiring, driven entirely by [`crate::config::LogConfig`].
//! Mirrors `groblegark-oddjobs`'s `setup_logging`: a non-blocking file
//! writer plus an optional stdout layer, composed as a `Vec` of boxed
//! layers so either can be present, absent, or both.

use crate::config::LogConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Installs the global subscriber. Returns the [`WorkerGuard`]s backing any
/// non-blocking writers; dropping them flushes pending log lines, so the
/// caller must keep them alive for the life of the process.
pub fn init(config: &LogConfig, verbose: bool) -> Vec<WorkerGuard> {
    let filter = build_filter(config, verbose);
    let ansi = config.format.as_deref() == Some("ansi");
    let use_rfc3339 = config.timestamp_format.as_deref() == Some("rfc3339");

    let mut layers: Vec<Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>> = Vec::new();
    let mut guards = Vec::new();

    if config.stdout {
        layers.push(stdout_layer(ansi, use_rfc3339));
    }

    if let Some(path) = &config.file {
        match file_layer(path) {
            Ok((layer, guard)) => {
                guards.push(guard);
                layers.push(layer);
            }
            Err(error) => {
                eprintln!("warning: failed to open log file {path:?}: {error}");
            }
        }
    }

    tracing_subscriber::registry().with(filter).with(layers).init();
    guards
}

fn build_filter(config: &LogConfig, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    if let Some(level) = &config.level {
        return EnvFilter::new(level);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stdout_layer(
    ansi: bool,
    use_rfc3339: bool,
) -> Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync> {
    if use_rfc3339 {
        fmt::layer()
            .with_ansi(ansi)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .boxed()
    } else {
        fmt::layer().with_ansi(ansi).boxed()
    }
}

fn file_layer(
    path: &str,
) -> std::io::Result<(
    Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>,
    WorkerGuard,
)> {
    let path = Path::new(path);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "log file path has no file name")
    })?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer().with_ansi(false).with_writer(non_blocking).boxed();
    Ok((layer, guard))
}
