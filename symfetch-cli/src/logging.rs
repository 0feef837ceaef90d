//! Log setup for the `symfetch` binary.
//!
//! `fetch` always writes `symsrv-fetch.log` in the state directory at INFO.
//! With `-v` it also writes `verbose.log` at DEBUG and mirrors DEBUG to the
//! console. `RUST_LOG`, when set, replaces the level filters.
//!
//! `upload` and `trigger` only log to the console.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{self, RollingFileAppender};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use symfetch_core::paths;

use crate::log_rotation;

/// Flushes the file writers when dropped; hold it for the whole run.
#[must_use = "dropping the guards stops file logging"]
pub struct LogGuards(#[allow(dead_code)] Vec<WorkerGuard>);

fn level(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn file_writer(dir: &Path, name: &str) -> Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(rolling::Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)
        .with_context(|| format!("failed to open log file {}", dir.join(name).display()))?;
    Ok(tracing_appender::non_blocking(appender))
}

/// File logging for a fetch run, plus the console when `verbose`.
pub fn init_run_logs(state_dir: &Path, verbose: bool) -> Result<LogGuards> {
    std::fs::create_dir_all(state_dir)
        .with_context(|| format!("failed to create state directory {}", state_dir.display()))?;

    let mut logs = vec![paths::fetch_log_path(state_dir)];
    if verbose {
        logs.push(paths::verbose_log_path(state_dir));
    }
    let rotations = log_rotation::rotate_logs(&logs);

    let mut guards = Vec::new();
    let (fetch_writer, guard) = file_writer(state_dir, paths::FETCH_LOG)?;
    guards.push(guard);
    let fetch_layer = fmt::layer()
        .with_writer(fetch_writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(level("info"));

    let (verbose_file, console) = if verbose {
        let (writer, guard) = file_writer(state_dir, paths::VERBOSE_LOG)?;
        guards.push(guard);
        let file = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_line_number(true)
            .with_filter(level("debug"));
        let console = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(level("debug"));
        (Some(file), Some(console))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(fetch_layer)
        .with(verbose_file)
        .with(console)
        .try_init()
        .context("failed to install log subscriber")?;

    for rotation in rotations {
        match rotation.result {
            Ok(true) => tracing::info!(path = %rotation.path.display(), "log file rotated"),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(path = %rotation.path.display(), error = %err, "log rotation failed")
            }
        }
    }
    tracing::debug!(state_dir = %state_dir.display(), verbose, "logging initialized");

    Ok(LogGuards(guards))
}

/// Console-only logging at INFO, or DEBUG when `verbose`.
pub fn init_console(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(level(default)),
        )
        .try_init()
        .context("failed to install log subscriber")
}
