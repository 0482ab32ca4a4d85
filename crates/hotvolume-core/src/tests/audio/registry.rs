use crate::{AppIdentity, AudioError, FanOut, SessionRegistry, memory::MemoryBackend};

use std::sync::Arc;

const LEVEL_TOLERANCE: f32 = 1e-6;

fn registry_with(backend: &MemoryBackend) -> SessionRegistry {
    SessionRegistry::new(Box::new(backend.clone()))
}

/// WHAT: Refresh groups endpoints by identity
/// WHY: A browser with several renderer processes is one application
#[test]
fn given_multiple_processes_of_one_app_when_refreshing_then_grouped_under_one_identity() {
    // Given: Two chrome sessions and one spotify session
    let backend = MemoryBackend::new();
    backend.add_session("chrome.exe", 10, 0.5, false);
    backend.add_session("Chrome.exe", 11, 0.5, false);
    backend.add_session("Spotify.exe", 20, 0.8, false);
    let registry = registry_with(&backend);

    // When: Refreshing
    let snapshot = registry.refresh();

    // Then: Two identities, chrome holding both endpoints
    assert_eq!(
        registry.list_identities(),
        vec![AppIdentity::new("chrome.exe"), AppIdentity::new("spotify.exe")]
    );
    assert_eq!(snapshot.endpoints(&AppIdentity::new("chrome.exe")).len(), 2);
    assert_eq!(snapshot.endpoint_count(), 3);
}

/// WHAT: Registry reads the snapshot, not the live system
/// WHY: Staleness between refreshes is part of the contract
#[test]
fn given_new_session_after_refresh_when_listing_then_not_visible_until_next_refresh() {
    // Given: A refreshed registry
    let backend = MemoryBackend::new();
    backend.add_session("spotify.exe", 1, 0.5, false);
    let registry = registry_with(&backend);
    registry.refresh();

    // When: A new application starts playing audio
    backend.add_session("discord.exe", 2, 0.5, false);

    // Then: It only shows up after the next refresh
    assert_eq!(registry.list_identities().len(), 1);
    registry.refresh();
    assert_eq!(registry.list_identities().len(), 2);
}

/// WHAT: Enumeration failure yields an empty snapshot instead of an error
/// WHY: Callers treat "no sessions" uniformly
#[test]
fn given_enumeration_failure_when_refreshing_then_registry_empty() {
    // Given: A populated, refreshed registry
    let backend = MemoryBackend::new();
    backend.add_session("spotify.exe", 1, 0.5, false);
    let registry = registry_with(&backend);
    registry.refresh();
    assert!(!registry.snapshot().is_empty());

    // When: The next enumeration fails
    backend.set_enumeration_failure(true);
    let snapshot = registry.refresh();

    // Then: The prior snapshot is replaced by an empty one
    assert!(snapshot.is_empty());
    assert!(registry.list_identities().is_empty());
}

/// WHAT: Every refresh produces a newer snapshot version
/// WHY: Consumers hold one version and never see it mutate
#[test]
fn given_held_snapshot_when_refreshing_then_held_snapshot_unchanged() {
    // Given: A snapshot held by a consumer
    let backend = MemoryBackend::new();
    backend.add_session("spotify.exe", 1, 0.5, false);
    let registry = registry_with(&backend);
    let held = registry.refresh();

    // When: The system changes and the registry refreshes
    backend.remove_process(1);
    let fresh = registry.refresh();

    // Then: The held snapshot is untouched and older
    assert_eq!(held.identities().len(), 1);
    assert!(fresh.is_empty());
    assert!(fresh.version() > held.version());
    assert!(Arc::ptr_eq(&fresh, &registry.snapshot()));
}

/// WHAT: Volume is read from the first endpoint of an identity
/// WHY: Endpoints of one application are assumed to share a level
#[test]
#[allow(clippy::unwrap_used)]
fn given_identity_with_endpoints_when_getting_volume_then_first_endpoint_level() {
    // Given: Two endpoints for one identity
    let backend = MemoryBackend::new();
    backend.add_session("chrome.exe", 1, 0.3, true);
    backend.add_session("chrome.exe", 2, 0.9, false);
    let registry = registry_with(&backend);
    registry.refresh();
    let chrome = AppIdentity::new("chrome.exe");

    // When: Reading volume and mute
    let volume = registry.get_volume(&chrome).unwrap();
    let muted = registry.get_mute(&chrome).unwrap();

    // Then: The first endpoint answers
    assert!((volume - 0.3).abs() < LEVEL_TOLERANCE);
    assert!(muted);
}

/// WHAT: Reads for absent identities report "not found"
/// WHY: Not found must not be confused with a zero volume
#[test]
fn given_absent_identity_when_reading_then_session_not_found() {
    // Given: A registry without the requested application
    let backend = MemoryBackend::new();
    let registry = registry_with(&backend);
    registry.refresh();
    let vlc = AppIdentity::new("vlc.exe");

    // When: Reading volume and mute
    let volume = registry.get_volume(&vlc);
    let muted = registry.get_mute(&vlc);

    // Then: Both are distinguishable not-found errors
    assert!(matches!(volume, Err(AudioError::SessionNotFound { .. })));
    assert!(matches!(muted, Err(AudioError::SessionNotFound { .. })));
}

/// WHAT: set_volume on zero endpoints reports not found and writes nothing
/// WHY: Writes must never be attempted against a missing application
#[test]
fn given_no_endpoints_when_setting_volume_then_not_found_and_no_writes() {
    // Given: An unrelated application only
    let backend = MemoryBackend::new();
    let other = backend.add_session("discord.exe", 1, 0.5, false);
    let registry = registry_with(&backend);
    registry.refresh();

    // When: Setting volume for an absent identity
    let result = registry.set_volume(&AppIdentity::new("spotify.exe"), 0.2);

    // Then: Not found, nothing written anywhere
    assert!(result.as_ref().is_err_and(AudioError::is_not_found));
    assert_eq!(other.write_count(), 0);
}

/// WHAT: set_volume writes every endpoint and clamps the level
/// WHY: One logical volume change must reach all streams of an application
#[test]
#[allow(clippy::unwrap_used)]
fn given_many_endpoints_when_setting_out_of_range_volume_then_all_clamped() {
    // Given: Two chrome endpoints
    let backend = MemoryBackend::new();
    let first = backend.add_session("chrome.exe", 1, 0.5, false);
    let second = backend.add_session("chrome.exe", 2, 0.7, false);
    let registry = registry_with(&backend);
    registry.refresh();

    // When: Setting a level above the maximum
    let fan_out = registry
        .set_volume(&AppIdentity::new("chrome.exe"), 1.7)
        .unwrap();

    // Then: Both endpoints are clamped to 1.0
    assert_eq!(fan_out, FanOut::Complete { endpoints: 2 });
    assert!((first.volume() - 1.0).abs() < LEVEL_TOLERANCE);
    assert!((second.volume() - 1.0).abs() < LEVEL_TOLERANCE);
}

/// WHAT: One failing endpoint does not stop the others (best-effort fan-out)
/// WHY: Pins the chosen fan-out policy: partial success is reported, not rolled back
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_failing_endpoint_when_muting_then_others_updated_and_partial_reported() {
    // Given: Three endpoints, the middle one failing
    let backend = MemoryBackend::new();
    let first = backend.add_session("chrome.exe", 1, 0.5, false);
    let broken = backend.add_session("chrome.exe", 2, 0.5, false);
    let third = backend.add_session("chrome.exe", 3, 0.5, false);
    broken.set_failing(true);
    let registry = registry_with(&backend);
    registry.refresh();

    // When: Muting the application
    let fan_out = registry
        .set_mute(&AppIdentity::new("chrome.exe"), true)
        .unwrap();

    // Then: Healthy endpoints are muted, the failure is counted
    assert_eq!(fan_out, FanOut::Partial { applied: 2, failed: 1 });
    assert!(!fan_out.is_complete());
    assert!(first.is_muted());
    assert!(!broken.is_muted());
    assert!(third.is_muted());
}

/// WHAT: A write where every endpoint fails is an error
/// WHY: Total failure must be distinct from degraded success
#[test]
fn given_all_endpoints_failing_when_setting_volume_then_fan_out_failed() {
    // Given: A single failing endpoint
    let backend = MemoryBackend::new();
    let session = backend.add_session("spotify.exe", 1, 0.5, false);
    session.set_failing(true);
    let registry = registry_with(&backend);
    registry.refresh();

    // When: Setting volume
    let result = registry.set_volume(&AppIdentity::new("spotify.exe"), 0.2);

    // Then: FanOutFailed with the failure count
    assert!(matches!(
        result,
        Err(AudioError::FanOutFailed { failed: 1, .. })
    ));
}

/// WHAT: Endpoints from an old snapshot are never written once the stream is gone
/// WHY: Stale endpoints must be re-resolved, not reused
#[test]
fn given_closed_stream_when_writing_before_refresh_then_write_fails_instead_of_silently_succeeding() {
    // Given: A refreshed registry whose only stream then closes
    let backend = MemoryBackend::new();
    backend.add_session("spotify.exe", 1, 0.5, false);
    let registry = registry_with(&backend);
    registry.refresh();
    backend.remove_process(1);

    // When: Writing through the stale snapshot, then after a refresh
    let stale = registry.set_volume(&AppIdentity::new("spotify.exe"), 0.2);
    registry.refresh();
    let fresh = registry.set_volume(&AppIdentity::new("spotify.exe"), 0.2);

    // Then: Stale write fails, fresh lookup reports not found
    assert!(matches!(stale, Err(AudioError::FanOutFailed { .. })));
    assert!(fresh.as_ref().is_err_and(AudioError::is_not_found));
}
