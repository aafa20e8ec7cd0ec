use anyhow::Result;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directory for log files
pub const LOG_DIR: &str = "logs";

/// Default log file name
pub const LOG_FILE: &str = "permissions.log";

/// Initialize logging into `logs/permissions.log`
pub fn init_logging() -> Result<()> {
    init_logging_in(LOG_DIR, LOG_FILE)
}

/// Initialize logging into a daily-rotated file in `dir`
///
/// Logs go to the file only, never to the console, so they don't mix with
/// a terminal host's prompts.
pub fn init_logging_in(dir: impl AsRef<Path>, file_name: &str) -> Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, file_name);

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Default to INFO level, can be overridden with RUST_LOG env var
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()?;

    tracing::info!("Logging system initialized");
    tracing::info!("Log files location: {}", dir.join(file_name).display());

    Ok(())
}

/// Check if a logs directory exists
pub fn logs_dir_exists(dir: impl AsRef<Path>) -> bool {
    dir.as_ref().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_log_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        assert!(!logs_dir_exists(&dir));

        // A global subscriber may already be set by another test; the
        // directory is created either way
        let _ = init_logging_in(&dir, LOG_FILE);
        assert!(logs_dir_exists(&dir));
    }
}
