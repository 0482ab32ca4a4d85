//! Hotkey dispatch engine.
//!
//! Arms one OS hotkey per mapping and runs a single listener task that turns
//! press events into dispatches. Dispatches run one at a time, in press
//! order, on the runtime's blocking pool.

use crate::{
    AppResult,
    hotkey::{Dispatcher, HotkeyHook},
    mapping::{LoadOutcome, MappingStore, RemoveOutcome, Shortcut, ShortcutMapping},
};

use std::{
    collections::{HashMap, HashSet},
    mem,
    sync::{Arc, RwLock},
};

use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};

type ArmedTable = Arc<RwLock<HashMap<u32, Shortcut>>>;

enum EngineState {
    Stopped,
    Running {
        shutdown_tx: watch::Sender<bool>,
        listener: JoinHandle<()>,
    },
}

/// Owns the armed hotkeys and the listener lifecycle.
///
/// Lives on the thread that owns the OS hook. The listener itself runs on
/// the tokio runtime passed to [`new`](Self::new).
pub struct DispatchEngine {
    hook: Box<dyn HotkeyHook>,
    dispatcher: Dispatcher,
    runtime: Handle,
    armed: ArmedTable,
    state: EngineState,
}

impl DispatchEngine {
    /// Create a stopped engine.
    pub fn new(hook: Box<dyn HotkeyHook>, dispatcher: Dispatcher, runtime: Handle) -> Self {
        Self {
            hook,
            dispatcher,
            runtime,
            armed: Arc::new(RwLock::new(HashMap::new())),
            state: EngineState::Stopped,
        }
    }

    /// True while the listener is running.
    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running { .. })
    }

    /// Number of shortcuts currently registered with the OS.
    pub fn armed_count(&self) -> usize {
        self.armed.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Mapping store shared with the dispatcher.
    pub fn store(&self) -> &Arc<MappingStore> {
        self.dispatcher.store()
    }

    /// Dispatcher used by the listener.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Arm every mapping and start the listener.
    ///
    /// Does nothing when already running. Shortcuts the OS refuses are
    /// logged and skipped; only failing to route events is an error.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> AppResult<()> {
        if self.is_running() {
            debug!("Dispatch engine already running");
            return Ok(());
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        self.hook.forward_events(Some(event_tx))?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let listener = self.runtime.spawn(listen(
            event_rx,
            shutdown_rx,
            Arc::clone(&self.armed),
            self.dispatcher.clone(),
        ));

        self.state = EngineState::Running {
            shutdown_tx,
            listener,
        };
        self.sync_armed();

        info!(armed = self.armed_count(), "Dispatch engine started");
        Ok(())
    }

    /// Disarm every shortcut and stop the listener.
    ///
    /// Presses already queued are dispatched before the listener exits.
    /// Does nothing when already stopped.
    ///
    /// Blocks until the listener has exited. Must be called from outside the
    /// runtime; from inside it the listener is only signalled, and presses
    /// still queued may be dispatched after this returns.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        let EngineState::Running {
            shutdown_tx,
            listener,
        } = mem::replace(&mut self.state, EngineState::Stopped)
        else {
            debug!("Dispatch engine already stopped");
            return;
        };

        if let Err(e) = self.hook.forward_events(None) {
            warn!(error = ?e, "Failed to detach hotkey event handler");
        }

        let _ = shutdown_tx.send(true);

        if Handle::try_current().is_ok() {
            error!("stop() called from inside the runtime, not waiting for the listener to exit");
        } else if let Err(e) = self.runtime.block_on(listener) {
            error!(error = ?e, "Hotkey listener task panicked");
        }

        self.disarm_all();
        info!("Dispatch engine stopped");
    }

    /// Add or replace a mapping, arming it immediately when running.
    #[instrument(skip(self))]
    pub fn add_mapping(&mut self, shortcut: &str, app: &str, action: &str, step: f64) -> AppResult<ShortcutMapping> {
        let result = self.store().add(shortcut, app, action, step);
        self.sync_if_running();
        result
    }

    /// Remove a mapping, disarming it immediately when running.
    #[instrument(skip(self))]
    pub fn remove_mapping(&mut self, shortcut: &str) -> AppResult<RemoveOutcome> {
        let shortcut = Self::test_combination(shortcut)?;
        let result = self.store().remove(&shortcut);
        self.sync_if_running();
        result
    }

    /// Re-read the mapping file and re-arm to match it.
    #[instrument(skip(self))]
    pub fn reload_mappings(&mut self) -> LoadOutcome {
        let outcome = self.store().load();
        self.sync_if_running();
        outcome
    }

    /// Check a combination against the shortcut grammar without touching anything.
    pub fn test_combination(shortcut: &str) -> AppResult<Shortcut> {
        shortcut.parse()
    }

    fn sync_if_running(&mut self) {
        if self.is_running() {
            self.sync_armed();
        }
    }

    /// Make the armed set equal to the store's shortcuts.
    fn sync_armed(&mut self) {
        let wanted: HashSet<Shortcut> = self.store().shortcuts().into_iter().collect();
        let mut armed = self.armed.write().unwrap_or_else(|e| e.into_inner());

        armed.retain(|id, shortcut| {
            if wanted.contains(shortcut) {
                return true;
            }
            if let Err(e) = self.hook.disarm(shortcut) {
                warn!(shortcut = %shortcut, error = ?e, "Failed to disarm hotkey");
            }
            debug!(shortcut = %shortcut, id, "Hotkey disarmed");
            false
        });

        let already: HashSet<Shortcut> = armed.values().cloned().collect();
        for shortcut in wanted.difference(&already) {
            match self.hook.arm(shortcut) {
                Ok(id) => {
                    armed.insert(id, shortcut.clone());
                }
                Err(e) => warn!(shortcut = %shortcut, error = ?e, "Skipping hotkey"),
            }
        }
    }

    fn disarm_all(&mut self) {
        let mut armed = self.armed.write().unwrap_or_else(|e| e.into_inner());
        for (_, shortcut) in armed.drain() {
            if let Err(e) = self.hook.disarm(&shortcut) {
                warn!(shortcut = %shortcut, error = ?e, "Failed to disarm hotkey");
            }
        }
    }
}

impl Drop for DispatchEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Listener loop. Runs each dispatch to completion before taking the next press.
async fn listen(
    mut events: mpsc::UnboundedReceiver<u32>,
    mut shutdown: watch::Receiver<bool>,
    armed: ArmedTable,
    dispatcher: Dispatcher,
) {
    debug!("Hotkey listener started");

    loop {
        tokio::select! {
            biased;

            Some(id) = events.recv() => {
                let shortcut = armed.read().unwrap_or_else(|e| e.into_inner()).get(&id).cloned();
                let Some(shortcut) = shortcut else {
                    debug!(id, "Press for a hotkey that is no longer armed");
                    continue;
                };

                let dispatcher = dispatcher.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || dispatcher.dispatch(&shortcut)).await {
                    error!(error = ?e, "Dispatch task panicked");
                }
            }

            _ = shutdown.changed() => {
                info!("Hotkey listener shutting down");
                break;
            }
        }
    }
}
