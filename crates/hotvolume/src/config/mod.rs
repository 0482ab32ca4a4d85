mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod tray_config;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, logging_config::LoggingConfig,
    tray_config::TrayConfig,
};

pub(crate) const DEFAULT_START_HOTKEYS: bool = true;
pub(crate) const DEFAULT_QUICK_CONTROL_APPS: usize = 5;
pub(crate) const DEFAULT_LOG_FILTER: &str = "hotvolume=info,hotvolume_core=info";

pub(crate) fn default_start_hotkeys() -> bool {
    DEFAULT_START_HOTKEYS
}

pub(crate) fn default_manual_step() -> f64 {
    hotvolume_core::volume::DEFAULT_STEP
}

pub(crate) fn default_quick_control_apps() -> usize {
    DEFAULT_QUICK_CONTROL_APPS
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

pub(crate) fn default_log_file() -> bool {
    true
}
