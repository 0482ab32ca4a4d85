use crate::config::{default_log_file, default_log_filter};

use serde::{Deserialize, Serialize};

/// Logging configuration. `RUST_LOG` takes precedence over `filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Also write a daily rolling log file.
    #[serde(default = "default_log_file")]
    pub file: bool,

    /// Write the log file as JSON lines instead of text.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            file: default_log_file(),
            json: false,
        }
    }
}
