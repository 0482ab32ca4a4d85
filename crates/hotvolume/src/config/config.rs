//! Configuration management for hotvolume.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths and atomic write operations. The mapping table is stored in its own
//! file next to `config.toml`.

use crate::{
    AppError, AppResult, atomic_write,
    config::{BehaviourConfig, LoggingConfig, TrayConfig},
};

use std::{
    fs,
    panic::Location,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use hotvolume_core::volume::validate_step;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

const CONFIG_FILE: &str = "config.toml";
const MAPPINGS_FILE: &str = "mappings.toml";

/// Main configuration struct.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Application behavior settings.
    #[serde(default)]
    pub behaviour: BehaviourConfig,
    /// System tray settings.
    #[serde(default)]
    pub tray: TrayConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the platform config directory, creating a
    /// default file if none exists.
    #[track_caller]
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load configuration from `path`, creating a default file if none exists.
    #[track_caller]
    #[instrument]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            info!(config_path = ?path, "No config found, default created");
            return Ok(config);
        }

        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        config.validate()?;

        info!(config_path = ?path, "Configuration loaded");

        Ok(config)
    }

    /// Save configuration to `path` using the atomic write pattern.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        atomic_write::write_atomic(path, &contents)?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Reject values that would only fail later, at the first hotkey press.
    #[track_caller]
    pub fn validate(&self) -> AppResult<()> {
        validate_step(self.behaviour.manual_step).map_err(|e| AppError::ConfigError {
            reason: format!("behaviour.manual_step: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(())
    }

    /// Default location of the mapping table.
    #[track_caller]
    pub fn mappings_path() -> AppResult<PathBuf> {
        Ok(Self::config_dir()?.join(MAPPINGS_FILE))
    }

    /// Directory for rolling log files.
    #[track_caller]
    pub fn log_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.data_local_dir().join("logs"))
    }

    #[track_caller]
    fn config_dir() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().to_path_buf())
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("com", "hotvolume", "HotVolume").ok_or_else(|| AppError::ConfigError {
            reason: "Failed to get project directories".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}
