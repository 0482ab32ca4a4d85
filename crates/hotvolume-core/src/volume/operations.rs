use crate::{
    AppIdentity, AudioError, CoreResult,
    audio::{FanOut, SessionRegistry},
    volume::VolumeAction,
};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// Step used when a mapping or manual control does not specify one.
pub const DEFAULT_STEP: f64 = 0.1;

/// Raise `volume` by `step`, saturating at 1.0.
pub fn increase(volume: f32, step: f32) -> f32 {
    (volume + step).min(1.0)
}

/// Lower `volume` by `step`, saturating at 0.0.
pub fn decrease(volume: f32, step: f32) -> f32 {
    (volume - step).max(0.0)
}

/// Reject steps outside of (0.0, 1.0].
#[track_caller]
pub fn validate_step(step: f64) -> CoreResult<f64> {
    if step.is_finite() && step > 0.0 && step <= 1.0 {
        Ok(step)
    } else {
        Err(AudioError::InvalidStep {
            step,
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// New state written by a successful action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActionOutcome {
    /// A volume level was written.
    Volume {
        /// Level written to every endpoint.
        level: f32,
        /// Fan-out result of the write.
        fan_out: FanOut,
    },
    /// A mute flag was written.
    Mute {
        /// Flag written to every endpoint.
        muted: bool,
        /// Fan-out result of the write.
        fan_out: FanOut,
    },
}

impl ActionOutcome {
    /// Fan-out result regardless of the kind of write.
    pub fn fan_out(&self) -> FanOut {
        match *self {
            ActionOutcome::Volume { fan_out, .. } | ActionOutcome::Mute { fan_out, .. } => fan_out,
        }
    }
}

/// Run one action against the registry's current snapshot.
///
/// Stepping actions and `toggle_mute` read the identity's representative
/// endpoint first; if the identity is absent the action fails with
/// [`AudioError::SessionNotFound`] instead of assuming a default. The read and
/// the write are not atomic with respect to other programs changing the volume.
#[track_caller]
#[instrument(skip(registry, identity), fields(identity = %identity))]
pub fn apply(
    registry: &SessionRegistry,
    identity: &AppIdentity,
    action: VolumeAction,
    step: f32,
) -> CoreResult<ActionOutcome> {
    let outcome = match action {
        VolumeAction::Increase | VolumeAction::Decrease => {
            let current = registry.get_volume(identity)?;
            let level = if action == VolumeAction::Increase {
                increase(current, step)
            } else {
                decrease(current, step)
            };
            let fan_out = registry.set_volume(identity, level)?;
            debug!(from = current, to = level, "Volume stepped");
            ActionOutcome::Volume { level, fan_out }
        }
        VolumeAction::Mute | VolumeAction::Unmute => {
            let muted = action == VolumeAction::Mute;
            let fan_out = registry.set_mute(identity, muted)?;
            ActionOutcome::Mute { muted, fan_out }
        }
        VolumeAction::ToggleMute => {
            let muted = !registry.get_mute(identity)?;
            let fan_out = registry.set_mute(identity, muted)?;
            debug!(muted, "Mute toggled");
            ActionOutcome::Mute { muted, fan_out }
        }
    };

    Ok(outcome)
}
