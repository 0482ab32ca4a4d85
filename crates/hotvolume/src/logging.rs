//! Tracing subscriber setup.
//!
//! Human-readable logs go to stderr. When enabled, a daily rolling file in
//! the platform data directory receives the same events as text or JSON
//! lines through a non-blocking writer.

use crate::{AppError, AppResult, config::LoggingConfig};

use std::{panic::Location, path::Path};

use error_location::ErrorLocation;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const LOG_FILE_PREFIX: &str = "hotvolume";
const LOG_FILE_SUFFIX: &str = "log";

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the life of the process.
#[track_caller]
pub(crate) fn init(config: &LoggingConfig, log_dir: Option<&Path>) -> AppResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| AppError::LoggingInit {
            reason: format!("Invalid log filter '{}': {}", config.filter, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let (file_writer, guard) = match log_dir.filter(|_| config.file) {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .filename_suffix(LOG_FILE_SUFFIX)
                .build(dir)
                .map_err(|e| AppError::LoggingInit {
                    reason: format!("Failed to open log file in {:?}: {}", dir, e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let text_file_layer = file_writer
        .clone()
        .filter(|_| !config.json)
        .map(|writer| fmt::layer().with_writer(writer).with_ansi(false));

    let json_file_layer = file_writer
        .filter(|_| config.json)
        .map(|writer| fmt::layer().json().with_writer(writer));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(text_file_layer)
        .with(json_file_layer)
        .try_init()
        .map_err(|e| AppError::LoggingInit {
            reason: format!("Failed to install subscriber: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    Ok(guard)
}
