//! Tracing setup for the CLI.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default directive when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "steametl=info";

/// File name prefix of the rolling JSON log.
pub const LOG_FILE_PREFIX: &str = "steametl.log";

/// `RUST_LOG` if set and valid, otherwise `default_filter`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

/// Install the global subscriber.
///
/// Human-readable output goes to stderr so stdout stays free for command
/// output. With `logs_folder`, every event is also written as JSON to a
/// daily-rolling file in that folder.
///
/// Keep the returned guard alive until exit; dropping it flushes the file
/// writer.
pub fn init_logging(
    default_filter: &str,
    logs_folder: Option<&Path>,
) -> io::Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer().with_writer(io::stderr).with_target(false);

    let (file_layer, guard) = match logs_folder {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().json().with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter(default_filter))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::other(format!("failed to initialize tracing: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_logging_creates_folder() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");

        let guard = init_logging(DEFAULT_FILTER, Some(&logs)).unwrap();
        tracing::info!(target: "steametl", "logging initialized");

        assert!(guard.is_some());
        assert!(logs.is_dir());

        // A second global subscriber is refused.
        assert!(init_logging(DEFAULT_FILTER, None).is_err());
    }
}
