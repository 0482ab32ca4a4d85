use crate::config::default_quick_control_apps;

use serde::{Deserialize, Serialize};

/// System tray configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayConfig {
    /// How many live applications get a Quick Controls submenu.
    #[serde(default = "default_quick_control_apps")]
    pub quick_control_apps: usize,
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            quick_control_apps: default_quick_control_apps(),
        }
    }
}
