//! # Structured Logging
//!
//! tracing-subscriber initialization: level filter from configuration,
//! optional JSON output, optional non-blocking log file.
//!
//! Secret values (tokens, signatures, private keys) are never logged;
//! handlers log usernames and error kinds only.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;
use crate::errors::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// Returns the non-blocking writer guard when logging to a file; the guard
/// must be held for the lifetime of the process so buffered lines flush on
/// shutdown.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| Error::config(format!("invalid log level '{}': {}", config.level, e)))?;

    match config.file.as_deref() {
        Some(file) => {
            let path = Path::new(file);
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("invalid log file path '{}'", file)))?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if config.json {
                builder.json().init();
            } else {
                builder.init();
            }
            Ok(Some(guard))
        }
        None => {
            let builder = tracing_subscriber::fmt().with_env_filter(filter);
            if config.json {
                builder.json().init();
            } else {
                builder.init();
            }
            Ok(None)
        }
    }
}
