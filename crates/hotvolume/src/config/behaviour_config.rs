use crate::config::{default_manual_step, default_start_hotkeys};

use serde::{Deserialize, Serialize};

/// Application behavior configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Whether to arm hotkeys as soon as the tray starts.
    #[serde(default = "default_start_hotkeys")]
    pub start_hotkeys_on_launch: bool,

    /// Step used by tray quick controls and CLI `apply`.
    #[serde(default = "default_manual_step")]
    pub manual_step: f64,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            start_hotkeys_on_launch: default_start_hotkeys(),
            manual_step: default_manual_step(),
        }
    }
}
