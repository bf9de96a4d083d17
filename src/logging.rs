//! Logging setup.
//!
//! Configures tracing with JSON output to both stderr and a daily rotating
//! log file under the user's local data directory.

use crate::error::LoggingError;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Log directory name under the local data directory
const LOG_DIR: &str = "adaptive-quality";
/// Maximum number of log files to retain
const MAX_LOG_FILES: usize = 3;

/// Initialize logging to stderr and a rolling file.
///
/// The returned guard flushes the non-blocking writers on drop and must be
/// held for the lifetime of the application. `RUST_LOG` controls the level
/// (default `info`).
pub fn init_logging() -> Result<LogGuard, LoggingError> {
    let log_dir = log_directory()?;

    std::fs::create_dir_all(&log_dir).map_err(|e| LoggingError::DirectoryCreationFailed {
        path: log_dir.display().to_string(),
        source: e,
    })?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(MAX_LOG_FILES)
        .filename_prefix("adaptive-quality")
        .filename_suffix("log")
        .build(&log_dir)
        .map_err(|e| LoggingError::AppenderCreationFailed(e.to_string()))?;

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
    let (non_blocking_stderr, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = fmt::layer()
        .json()
        .with_timer(UtcTime::new(Rfc3339))
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(non_blocking_file);

    let stderr_layer = fmt::layer()
        .json()
        .with_timer(UtcTime::new(Rfc3339))
        .with_current_span(true)
        .with_writer(non_blocking_stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    Ok(LogGuard {
        _file_guard: file_guard,
        _stderr_guard: stderr_guard,
    })
}

/// Log directory: `<local data dir>/adaptive-quality`.
fn log_directory() -> Result<PathBuf, LoggingError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(LOG_DIR))
        .ok_or(LoggingError::DataDirectoryNotFound)
}

/// Keeps the non-blocking writers alive.
pub struct LogGuard {
    _file_guard: tracing_appender::non_blocking::WorkerGuard,
    _stderr_guard: tracing_appender::non_blocking::WorkerGuard,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directory() {
        if dirs::data_local_dir().is_some() {
            let path = log_directory().unwrap();
            assert!(path.ends_with(LOG_DIR));
        } else {
            assert!(matches!(
                log_directory(),
                Err(LoggingError::DataDirectoryNotFound)
            ));
        }
    }
}
