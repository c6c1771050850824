//! Tracing setup: stderr plus a daily rolling log file

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::models::AppSettings;

pub const LOG_FILE_PREFIX: &str = "blurr.log";

const DEFAULT_FILTER: &str = "info";

/// Filter directive from settings, `info` when unset
pub fn filter_directive(settings: &AppSettings) -> String {
    settings
        .log_filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FILTER)
        .to_string()
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `filter`.
///
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logging(log_dir: &Path, filter: &str) -> Result<WorkerGuard, String> {
    fs::create_dir_all(log_dir)
        .map_err(|e| format!("Failed to create log directory: {}", e))?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|e| format!("Invalid log filter {:?}: {}", filter, e))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .try_init()
        .map_err(|e| format!("Failed to install tracing subscriber: {}", e))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_filter_directive() {
        let mut settings = AppSettings::default();
        assert_eq!(filter_directive(&settings), "info");

        settings.log_filter = Some("  ".to_string());
        assert_eq!(filter_directive(&settings), "info");

        settings.log_filter = Some("blurr=debug".to_string());
        assert_eq!(filter_directive(&settings), "blurr=debug");
    }

    #[test]
    fn test_init_logging_creates_log_dir() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(&log_dir, "debug").unwrap();
        tracing::info!("logging initialised");
        drop(guard);

        assert!(log_dir.is_dir());
    }
}
