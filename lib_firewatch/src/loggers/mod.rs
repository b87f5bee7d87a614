//! # Logging Setup
//!
//! One call per binary: a console layer on stdout and a JSON file layer
//! written through a non-blocking appender. `RUST_LOG`, when set, wins over
//! the configured level.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Cannot prepare log directory {path}: {source}")]
    Dir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid log level `{0}`")]
    Level(String),

    #[error("A global subscriber is already installed")]
    AlreadyInstalled,
}

/// Installs the global subscriber.
///
/// Previous `<app_name>*.log` files are pruned first, keeping only the most
/// recent one. The returned guard flushes the file writer on drop; hold it
/// for the lifetime of the process.
pub fn setup_logging(log_dir: &Path, log_level: &str, app_name: &str) -> Result<WorkerGuard, LoggerError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggerError::Dir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    cleanup_old_logs(log_dir, app_name).map_err(|source| LoggerError::Dir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let log_file_name = format!("{}_{}.log", app_name, chrono::Local::now().format("%Y-%m-%d_%H-%M-%S"));
    let (non_blocking_appender, guard) = non_blocking(rolling::never(log_dir, &log_file_name));

    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_appender)
        .json();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|_| LoggerError::Level(log_level.to_string()))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggerError::AlreadyInstalled)?;

    info!(file = %log_dir.join(&log_file_name).display(), "Logging initialized with level: {}", log_level);
    Ok(guard)
}

/// Deletes every `<app_name>*.log` in `log_dir` except the newest.
pub fn cleanup_old_logs(log_dir: &Path, app_name: &str) -> io::Result<usize> {
    let mut entries: Vec<(std::time::SystemTime, PathBuf)> = fs::read_dir(log_dir)?
        .filter_map(|res| res.ok())
        .filter(|e| {
            let name = e.file_name();
            let name = name.to_string_lossy();
            name.starts_with(app_name) && name.ends_with(".log")
        })
        .filter_map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, e.path()))
        })
        .collect();

    // Newest first.
    entries.sort_by(|a, b| b.0.cmp(&a.0));

    let mut removed = 0;
    for (_, path) in entries.iter().skip(1) {
        match fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!("Failed to delete old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}
