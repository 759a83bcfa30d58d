use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

const DEFAULT_FILTER: &str = "feedsync=info";

/// Install the global subscriber.
///
/// Logs go to stderr unless a directory is configured, in which case they go
/// to a daily rolling file there. Keep the guard alive until exit so buffered
/// lines get flushed.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
  let filter =
    EnvFilter::try_from_env("FEEDSYNC_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

  let (writer, guard) = match &config.directory {
    Some(dir) => {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;
      tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "feedsync.log"))
    }
    None => tracing_appender::non_blocking(std::io::stderr()),
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(config.directory.is_none())
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
