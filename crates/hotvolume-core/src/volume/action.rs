use crate::{AudioError, CoreResult};

use std::{fmt, panic::Location, str::FromStr};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};

/// What a shortcut does to an application's audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeAction {
    /// Raise volume by the mapping's step.
    Increase,
    /// Lower volume by the mapping's step.
    Decrease,
    /// Mute every endpoint.
    Mute,
    /// Unmute every endpoint.
    Unmute,
    /// Flip the current mute state.
    ToggleMute,
}

impl VolumeAction {
    /// Every action, in display order.
    pub const ALL: [VolumeAction; 5] = [
        VolumeAction::Increase,
        VolumeAction::Decrease,
        VolumeAction::Mute,
        VolumeAction::Unmute,
        VolumeAction::ToggleMute,
    ];

    /// Persisted tag of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeAction::Increase => "increase",
            VolumeAction::Decrease => "decrease",
            VolumeAction::Mute => "mute",
            VolumeAction::Unmute => "unmute",
            VolumeAction::ToggleMute => "toggle_mute",
        }
    }

    /// True for actions that use the step size.
    pub fn uses_step(&self) -> bool {
        matches!(self, VolumeAction::Increase | VolumeAction::Decrease)
    }
}

impl fmt::Display for VolumeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeAction {
    type Err = AudioError;

    #[track_caller]
    fn from_str(s: &str) -> CoreResult<Self> {
        let tag = s.trim().to_lowercase();
        VolumeAction::ALL
            .into_iter()
            .find(|action| action.as_str() == tag)
            .ok_or_else(|| AudioError::UnknownAction {
                action: s.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
