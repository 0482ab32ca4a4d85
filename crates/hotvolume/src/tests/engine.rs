use crate::{
    AppError, AppResult,
    hotkey::{DispatchEngine, DispatchOutcome, Dispatcher, HotkeyHook},
    mapping::{MappingStore, RemoveOutcome, Shortcut},
};

use std::{
    collections::{HashMap, HashSet},
    panic::Location,
    sync::{Arc, Mutex},
};

use error_location::ErrorLocation;
use hotvolume_core::{
    ActionOutcome, AppIdentity, FanOut, SessionRegistry,
    memory::{MemoryBackend, MemorySession},
};
use tempfile::TempDir;
use tokio::{runtime::Runtime, sync::mpsc};

const LEVEL_TOLERANCE: f32 = 1e-6;

#[derive(Default)]
struct HookState {
    armed: HashMap<Shortcut, u32>,
    arm_calls: usize,
    refuse: HashSet<Shortcut>,
    fail_forward: bool,
    sink: Option<mpsc::UnboundedSender<u32>>,
}

/// Hook double that records registrations and lets tests press keys.
#[derive(Clone, Default)]
struct RecordingHook(Arc<Mutex<HookState>>);

impl RecordingHook {
    fn state(&self) -> std::sync::MutexGuard<'_, HookState> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn armed(&self) -> HashSet<Shortcut> {
        self.state().armed.keys().cloned().collect()
    }

    #[allow(clippy::unwrap_used)]
    fn press(&self, shortcut: &str) {
        let shortcut: Shortcut = shortcut.parse().unwrap();
        let state = self.state();
        let id = *state.armed.get(&shortcut).unwrap();
        state.sink.as_ref().unwrap().send(id).unwrap();
    }
}

impl HotkeyHook for RecordingHook {
    fn arm(&mut self, shortcut: &Shortcut) -> AppResult<u32> {
        let mut state = self.state();
        state.arm_calls += 1;
        if state.refuse.contains(shortcut) {
            return Err(AppError::HotkeyRegistrationFailed {
                reason: format!("'{shortcut}' is already registered by another application"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let id = shortcut.hotkey_id();
        state.armed.insert(shortcut.clone(), id);
        Ok(id)
    }

    fn disarm(&mut self, shortcut: &Shortcut) -> AppResult<()> {
        self.state().armed.remove(shortcut);
        Ok(())
    }

    fn forward_events(&mut self, sink: Option<mpsc::UnboundedSender<u32>>) -> AppResult<()> {
        let mut state = self.state();
        if state.fail_forward {
            return Err(AppError::HotkeyListenerFailed {
                reason: "no message pump".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        state.sink = sink;
        Ok(())
    }
}

struct Fixture {
    // Dropped first: stopping the engine needs the runtime.
    engine: DispatchEngine,
    hook: RecordingHook,
    backend: MemoryBackend,
    store: Arc<MappingStore>,
    runtime: Runtime,
    _dir: TempDir,
}

#[allow(clippy::unwrap_used)]
fn fixture(hook: RecordingHook) -> Fixture {
    let dir = TempDir::new().unwrap();
    let runtime = Runtime::new().unwrap();
    let backend = MemoryBackend::new();
    let registry = Arc::new(SessionRegistry::new(Box::new(backend.clone())));
    let store = Arc::new(MappingStore::open(dir.path().join("mappings.toml")));
    store.load();

    let engine = DispatchEngine::new(
        Box::new(hook.clone()),
        Dispatcher::new(registry, Arc::clone(&store)),
        runtime.handle().clone(),
    );

    Fixture {
        engine,
        hook,
        backend,
        store,
        runtime,
        _dir: dir,
    }
}

fn add_spotify(backend: &MemoryBackend, volume: f32) -> Arc<MemorySession> {
    backend.add_session("Spotify.exe", 42, volume, false)
}

/// WHAT: start() twice succeeds both times with one set of armed hotkeys
/// WHY: Start must be idempotent
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_engine_when_starting_again_then_single_armed_set() {
    // Given: An engine over the default table
    let mut f = fixture(RecordingHook::default());

    // When: Starting twice
    f.engine.start().unwrap();
    f.engine.start().unwrap();

    // Then: Nine hotkeys armed exactly once
    assert!(f.engine.is_running());
    assert_eq!(f.engine.armed_count(), 9);
    assert_eq!(f.hook.state().arm_calls, 9);
    assert_eq!(f.hook.armed().len(), 9);
}

/// WHAT: Pressing a mapped shortcut lowers the application's volume by the step
/// WHY: End-to-end hotkey behaviour
#[test]
#[allow(clippy::unwrap_used)]
fn given_spotify_at_half_when_pressing_decrease_shortcut_then_volume_lowered() {
    // Given: ctrl+shift+f1 -> spotify decrease 0.1, spotify at 0.5
    let mut f = fixture(RecordingHook::default());
    let spotify = add_spotify(&f.backend, 0.5);
    f.engine.start().unwrap();

    // When: The shortcut is pressed and the engine stopped
    f.hook.press("ctrl+shift+f1");
    f.engine.stop();

    // Then: The queued press was dispatched before the listener exited
    assert!((spotify.volume() - 0.4).abs() < LEVEL_TOLERANCE);
}

/// WHAT: Presses are dispatched one at a time, in order
/// WHY: Concurrent read-modify-write would lose steps
#[test]
#[allow(clippy::unwrap_used)]
fn given_three_queued_presses_when_draining_then_each_step_applied() {
    let mut f = fixture(RecordingHook::default());
    let spotify = add_spotify(&f.backend, 0.5);
    f.engine.start().unwrap();

    f.hook.press("ctrl+shift+f1");
    f.hook.press("ctrl+shift+f1");
    f.hook.press("ctrl+shift+f2");
    f.engine.stop();

    assert!((spotify.volume() - 0.4).abs() < LEVEL_TOLERANCE);
}

/// WHAT: stop() disarms everything and is idempotent
/// WHY: Armed hotkeys never outlive the listener
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_engine_when_stopping_twice_then_nothing_armed() {
    let mut f = fixture(RecordingHook::default());
    f.engine.start().unwrap();

    f.engine.stop();
    f.engine.stop();

    assert!(!f.engine.is_running());
    assert_eq!(f.engine.armed_count(), 0);
    assert!(f.hook.armed().is_empty());
    assert!(f.hook.state().sink.is_none());
}

/// WHAT: Adding and removing mappings while running arms and disarms immediately
/// WHY: Configuration changes take effect without a restart
#[test]
#[allow(clippy::unwrap_used)]
fn given_running_engine_when_adding_and_removing_then_armed_set_follows() {
    // Given: A running engine
    let mut f = fixture(RecordingHook::default());
    f.engine.start().unwrap();
    let new_shortcut: Shortcut = "alt+m".parse().unwrap();

    // When: Adding a mapping
    f.engine.add_mapping("alt+m", "vlc.exe", "toggle_mute", 0.1).unwrap();

    // Then: It is armed at once
    assert!(f.hook.armed().contains(&new_shortcut));
    assert_eq!(f.engine.armed_count(), 10);

    // When: Removing it again
    let outcome = f.engine.remove_mapping("ALT+M").unwrap();

    // Then: Disarmed and removed from the store
    assert!(matches!(outcome, RemoveOutcome::Removed(_)));
    assert!(!f.hook.armed().contains(&new_shortcut));
    assert_eq!(f.store.len(), 9);
}

/// WHAT: Mapping changes while stopped arm nothing
/// WHY: Armed hotkeys exist only while running
#[test]
#[allow(clippy::unwrap_used)]
fn given_stopped_engine_when_adding_then_stored_but_not_armed() {
    let mut f = fixture(RecordingHook::default());

    f.engine.add_mapping("alt+m", "vlc.exe", "mute", 0.1).unwrap();

    assert_eq!(f.store.len(), 10);
    assert!(f.hook.armed().is_empty());
}

/// WHAT: A shortcut the OS refuses is skipped, the others are armed
/// WHY: One conflicting hotkey must not disable the rest
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_refused_shortcut_when_starting_then_others_armed() {
    // Given: The OS refuses ctrl+shift+f5
    let hook = RecordingHook::default();
    hook.state().refuse.insert("ctrl+shift+f5".parse().unwrap());
    let mut f = fixture(hook);

    // When: Starting
    f.engine.start().unwrap();

    // Then: Running with eight hotkeys
    assert!(f.engine.is_running());
    assert_eq!(f.engine.armed_count(), 8);
}

/// WHAT: Failing to route events is a start failure and leaves the engine stopped
/// WHY: Without a listener no hotkey can ever fire
#[test]
fn given_event_routing_failure_when_starting_then_error_and_stopped() {
    let hook = RecordingHook::default();
    hook.state().fail_forward = true;
    let mut f = fixture(hook);

    let result = f.engine.start();

    assert!(matches!(result, Err(AppError::HotkeyListenerFailed { .. })));
    assert!(!f.engine.is_running());
    assert!(f.hook.armed().is_empty());
}

/// WHAT: Dispatching a shortcut with no mapping is a no-op
/// WHY: Stale OS events must not touch any application
#[test]
#[allow(clippy::unwrap_used)]
fn given_unmapped_shortcut_when_dispatching_then_unmapped_and_no_enumeration() {
    let f = fixture(RecordingHook::default());

    let outcome = f.engine.dispatcher().dispatch(&"ctrl+alt+q".parse().unwrap());

    assert!(matches!(outcome, DispatchOutcome::Unmapped));
    assert_eq!(f.backend.enumeration_count(), 0);
}

/// WHAT: Dispatch refreshes the registry before acting
/// WHY: Applications that started after the last refresh must be reachable
#[test]
#[allow(clippy::unwrap_used)]
fn given_app_started_after_last_refresh_when_dispatching_then_found() {
    // Given: Spotify appears after the engine was built
    let f = fixture(RecordingHook::default());
    let spotify = add_spotify(&f.backend, 0.5);

    // When: Dispatching its increase shortcut
    let outcome = f.engine.dispatcher().dispatch(&"ctrl+shift+f2".parse().unwrap());

    // Then: Applied to the new session
    assert!(matches!(
        outcome,
        DispatchOutcome::Applied(ActionOutcome::Volume { .. })
    ));
    assert!((spotify.volume() - 0.6).abs() < LEVEL_TOLERANCE);
}

/// WHAT: Dispatch for an application without audio reports AppNotFound
/// WHY: Not found is an expected outcome, distinct from a failure
#[test]
#[allow(clippy::unwrap_used)]
fn given_app_not_playing_when_dispatching_then_app_not_found() {
    let f = fixture(RecordingHook::default());

    let outcome = f.engine.dispatcher().dispatch(&"ctrl+shift+f6".parse().unwrap());

    assert!(matches!(
        outcome,
        DispatchOutcome::AppNotFound(ref identity) if *identity == AppIdentity::new("chrome.exe")
    ));
}

/// WHAT: Reloading after an external edit re-arms to match the file
/// WHY: Editing the mapping file and choosing Reload must take effect
#[test]
#[allow(clippy::unwrap_used)]
fn given_file_edited_externally_when_reloading_then_armed_set_matches_file() {
    // Given: A running engine and a file rewritten with a single mapping
    let mut f = fixture(RecordingHook::default());
    f.engine.start().unwrap();
    std::fs::write(
        f.store.path(),
        "version = 1\n[mappings.\"ctrl+alt+v\"]\napp = \"vlc.exe\"\naction = \"mute\"\n",
    )
    .unwrap();

    // When: Reloading
    f.engine.reload_mappings();

    // Then: Only the new shortcut is armed
    let expected: HashSet<Shortcut> = ["ctrl+alt+v".parse().unwrap()].into_iter().collect();
    assert_eq!(f.hook.armed(), expected);
    assert_eq!(f.engine.armed_count(), 1);
}

/// WHAT: test_combination validates without touching the store
/// WHY: The configuration surface checks input before saving it
#[test]
#[allow(clippy::unwrap_used)]
fn given_combinations_when_testing_then_only_grammar_checked() {
    assert_eq!(
        DispatchEngine::test_combination("Win+Shift+PageUp").unwrap().to_string(),
        "shift+super+pageup"
    );
    assert!(DispatchEngine::test_combination("ctrl+alt").is_err());
}

/// WHAT: Presses after a stop/start cycle reach the new listener
/// WHY: Toggling hotkeys off and on from the tray must keep them working
#[test]
#[allow(clippy::unwrap_used)]
fn given_restarted_engine_when_pressing_then_action_dispatched() {
    // Given: An engine that was started, stopped and started again
    let mut f = fixture(RecordingHook::default());
    let spotify = add_spotify(&f.backend, 0.5);
    f.engine.start().unwrap();
    f.engine.stop();
    f.engine.start().unwrap();

    // When: A shortcut is pressed
    f.hook.press("ctrl+shift+f1");
    f.engine.stop();

    // Then: The second listener dispatched it
    assert_eq!(f.engine.armed_count(), 0);
    assert!((spotify.volume() - 0.4).abs() < LEVEL_TOLERANCE);
}

/// WHAT: A dispatch that reaches only some sessions reports Partial
/// WHY: Degraded success must be distinguishable from success and failure
#[test]
#[allow(clippy::unwrap_used)]
fn given_one_failing_session_when_dispatching_then_partial_and_healthy_updated() {
    // Given: Two Spotify sessions, the second one failing
    let f = fixture(RecordingHook::default());
    let healthy = add_spotify(&f.backend, 0.5);
    let broken = f.backend.add_session("Spotify.exe", 43, 0.5, false);
    broken.set_failing(true);

    // When: Dispatching the decrease shortcut
    let outcome = f.engine.dispatcher().dispatch(&"ctrl+shift+f1".parse().unwrap());

    // Then: Partial, with the healthy session lowered and the broken one untouched
    let DispatchOutcome::Partial(result) = outcome else {
        unreachable!("expected a partial outcome");
    };
    assert_eq!(
        result.fan_out(),
        FanOut::Partial {
            applied: 1,
            failed: 1
        }
    );
    assert_eq!(result.fan_out().applied(), 1);
    assert!((healthy.volume() - 0.4).abs() < LEVEL_TOLERANCE);
    assert_eq!(broken.write_count(), 0);
}

/// WHAT: stop() from inside the runtime still stops and disarms, without joining
/// WHY: Blocking on the listener from a runtime thread would panic
#[test]
#[allow(clippy::unwrap_used)]
fn given_stop_called_inside_runtime_when_stopping_then_stopped_and_disarmed() {
    // Given: A running engine
    let mut f = fixture(RecordingHook::default());
    f.engine.start().unwrap();

    // When: Stopping from async code
    let engine = &mut f.engine;
    f.runtime.block_on(async { engine.stop() });

    // Then: Stopped, nothing armed, events detached
    assert!(!f.engine.is_running());
    assert_eq!(f.engine.armed_count(), 0);
    assert!(f.hook.armed().is_empty());
    assert!(f.hook.state().sink.is_none());
}
