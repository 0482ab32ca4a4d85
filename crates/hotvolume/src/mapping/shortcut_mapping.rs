use crate::mapping::Shortcut;

use std::fmt;

use hotvolume_core::{AppIdentity, VolumeAction};

/// Binds a shortcut to an action on one application.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutMapping {
    /// Combination that triggers the action.
    pub shortcut: Shortcut,
    /// Application whose sessions are adjusted.
    pub app: AppIdentity,
    /// What happens to the application's audio.
    pub action: VolumeAction,
    /// Step for increase/decrease, within (0.0, 1.0].
    pub step: f64,
}

impl fmt::Display for ShortcutMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} {}", self.shortcut, self.app, self.action)?;
        if self.action.uses_step() {
            write!(f, " (step {})", self.step)?;
        }
        Ok(())
    }
}
