use crate::{
    ActionOutcome, AppIdentity, AudioError, FanOut, SessionRegistry, VolumeAction,
    memory::MemoryBackend,
    volume::{self, decrease, increase, validate_step},
};

const LEVEL_TOLERANCE: f32 = 1e-6;
const STEPS: [f32; 4] = [0.01, 0.1, 0.25, 1.0];
const LEVELS: [f32; 6] = [0.0, 0.05, 0.4, 0.5, 0.95, 1.0];

/// WHAT: increase and decrease saturate at the range bounds
/// WHY: Volume must stay within [0, 1] for any step
#[test]
fn given_levels_and_steps_when_stepping_then_results_saturate() {
    for v in LEVELS {
        for s in STEPS {
            assert!((increase(v, s) - (v + s).min(1.0)).abs() < LEVEL_TOLERANCE);
            assert!((decrease(v, s) - (v - s).max(0.0)).abs() < LEVEL_TOLERANCE);
        }
    }
}

/// WHAT: Stepping at the boundary is idempotent
/// WHY: Holding the hotkey at full volume must not overshoot
#[test]
fn given_boundary_levels_when_stepping_outward_then_unchanged() {
    for s in STEPS {
        assert_eq!(increase(1.0, s), 1.0);
        assert_eq!(decrease(0.0, s), 0.0);
    }
}

/// WHAT: Step validation accepts (0, 1] only
/// WHY: Zero, negative, NaN or oversized steps are configuration errors
#[test]
fn given_candidate_steps_when_validating_then_only_valid_range_accepted() {
    assert!(validate_step(0.1).is_ok());
    assert!(validate_step(1.0).is_ok());
    for bad in [0.0, -0.1, 1.01, f64::NAN, f64::INFINITY] {
        assert!(matches!(
            validate_step(bad),
            Err(AudioError::InvalidStep { .. })
        ));
    }
}

/// WHAT: Decrease writes the stepped level to the application
/// WHY: Core hotkey behaviour
#[test]
#[allow(clippy::unwrap_used)]
fn given_app_at_half_volume_when_decreasing_then_level_lowered_by_step() {
    // Given: Spotify at 0.5
    let backend = MemoryBackend::new();
    let spotify = backend.add_session("Spotify.exe", 1, 0.5, false);
    let registry = SessionRegistry::new(Box::new(backend.clone()));
    registry.refresh();

    // When: Decreasing by 0.1
    let outcome = volume::apply(
        &registry,
        &AppIdentity::new("spotify.exe"),
        VolumeAction::Decrease,
        0.1,
    )
    .unwrap();

    // Then: Spotify is at 0.4
    assert!((spotify.volume() - 0.4).abs() < LEVEL_TOLERANCE);
    assert!(matches!(
        outcome,
        ActionOutcome::Volume {
            fan_out: FanOut::Complete { endpoints: 1 },
            ..
        }
    ));
}

/// WHAT: Toggling mute twice restores the original state
/// WHY: toggle_mute must be its own inverse
#[test]
#[allow(clippy::unwrap_used)]
fn given_unmuted_app_when_toggling_twice_then_unmuted_again() {
    // Given: An unmuted application
    let backend = MemoryBackend::new();
    let discord = backend.add_session("discord.exe", 1, 0.5, false);
    let registry = SessionRegistry::new(Box::new(backend.clone()));
    registry.refresh();
    let identity = AppIdentity::new("discord.exe");

    // When: Toggling once, then again
    let first = volume::apply(&registry, &identity, VolumeAction::ToggleMute, 0.1).unwrap();
    let muted_after_first = discord.is_muted();
    let second = volume::apply(&registry, &identity, VolumeAction::ToggleMute, 0.1).unwrap();

    // Then: Muted after one toggle, restored after two
    assert!(muted_after_first);
    assert!(matches!(first, ActionOutcome::Mute { muted: true, .. }));
    assert!(matches!(second, ActionOutcome::Mute { muted: false, .. }));
    assert!(!discord.is_muted());
}

/// WHAT: toggle_mute on an absent application fails instead of guessing
/// WHY: Without a readable state there is nothing to toggle
#[test]
fn given_absent_app_when_toggling_mute_then_not_found_and_nothing_written() {
    // Given: Only an unrelated application
    let backend = MemoryBackend::new();
    let other = backend.add_session("chrome.exe", 1, 0.5, false);
    let registry = SessionRegistry::new(Box::new(backend.clone()));
    registry.refresh();

    // When: Toggling mute for a missing app
    let result = volume::apply(
        &registry,
        &AppIdentity::new("spotify.exe"),
        VolumeAction::ToggleMute,
        0.1,
    );

    // Then: Not found, nothing written
    assert!(result.as_ref().is_err_and(AudioError::is_not_found));
    assert_eq!(other.write_count(), 0);
}

/// WHAT: Explicit mute and unmute ignore the current state
/// WHY: Repeated presses must be safe
#[test]
#[allow(clippy::unwrap_used)]
fn given_muted_app_when_muting_again_then_still_muted() {
    let backend = MemoryBackend::new();
    let vlc = backend.add_session("vlc.exe", 1, 0.5, true);
    let registry = SessionRegistry::new(Box::new(backend.clone()));
    registry.refresh();
    let identity = AppIdentity::new("vlc.exe");

    volume::apply(&registry, &identity, VolumeAction::Mute, 0.1).unwrap();
    assert!(vlc.is_muted());

    volume::apply(&registry, &identity, VolumeAction::Unmute, 0.1).unwrap();
    assert!(!vlc.is_muted());
}
