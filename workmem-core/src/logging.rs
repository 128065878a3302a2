//! Logging infrastructure for workmem
//!
//! Logs are written to `~/.local/state/workmem/` following XDG standards.
//! Nothing is written to stdout or stderr: workmem runs inside session hooks
//! whose output is visible to the session.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use chrono::Utc;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize the logging system
///
/// Sets up tracing with:
/// - File output to XDG state directory
/// - Daily rotation, keeping at most `max_files` files
/// - Configurable log level via config or RUST_LOG env var
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("workmem")
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| Error::Config(format!("failed to create log appender: {}", e)))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // A hook may be invoked in a process that already set a subscriber.
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install subscriber: {}", e)))?;

    tracing::info!(
        log_dir = %log_dir.display(),
        level = %config.level,
        "Logging initialized"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Guard that keeps the logging system alive
///
/// When dropped, flushes any pending log writes.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Returns today's log file path
///
/// The appender rotates on UTC day boundaries, so the date is taken in UTC.
pub fn log_file_path() -> PathBuf {
    Config::log_path(Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_path_matches_rotated_name() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 11, 10).unwrap();
        let path = Config::log_path(date);
        assert!(path.ends_with("workmem/workmem.2025-11-10.log"));

        let today = log_file_path();
        let name = today.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("workmem.") && name.ends_with(".log"));
        assert_eq!(name.len(), "workmem.YYYY-MM-DD.log".len());
    }
}
