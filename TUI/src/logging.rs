//! File logging. The terminal belongs to the UI, so nothing is written to
//! stdout or stderr while it runs.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Keep alive for the life of the program; dropping it flushes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// `filter` overrides `RUST_LOG`; both fall back to `info`.
pub fn init(filter: Option<&str>) -> std::io::Result<LoggingGuard> {
    let log_dir = log_dir();
    fs::create_dir_all(&log_dir)?;
    let path = log_dir.join("acme-chat.log");

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let (writer, file_guard) = tracing_appender::non_blocking(file);

    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    tracing::info!(log_path = %path.display(), "logging initialized");

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("acme-chat").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("acme-chat-logs"))
}
