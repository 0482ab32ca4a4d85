//! OS-level global hotkey registration.

use crate::{AppError, AppResult, mapping::Shortcut};

use std::{
    panic::Location,
    sync::{Mutex, Once},
};

use error_location::ErrorLocation;
use global_hotkey::{Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

static ROUTER: PressRouter = PressRouter::new();
static HANDLER_INSTALLED: Once = Once::new();

/// Registers shortcuts with the OS and reports presses.
///
/// Presses are reported as the id returned from [`arm`](Self::arm).
pub trait HotkeyHook {
    /// Register a shortcut. Returns the id its presses are reported with.
    fn arm(&mut self, shortcut: &Shortcut) -> AppResult<u32>;

    /// Unregister a previously armed shortcut.
    fn disarm(&mut self, shortcut: &Shortcut) -> AppResult<()>;

    /// Route press events into `sink`, or stop routing them with `None`.
    fn forward_events(&mut self, sink: Option<mpsc::UnboundedSender<u32>>) -> AppResult<()>;
}

/// Forwards presses into whichever listener is current.
///
/// `global-hotkey` keeps the first event handler installed for the whole
/// process and ignores later ones. The handler is therefore installed once
/// and each listener only swaps the sender behind it.
pub(crate) struct PressRouter {
    sink: Mutex<Option<mpsc::UnboundedSender<u32>>>,
}

impl PressRouter {
    pub(crate) const fn new() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    /// Replace the current listener. `None` drops presses until the next one.
    pub(crate) fn replace(&self, sink: Option<mpsc::UnboundedSender<u32>>) {
        *self.sink.lock().unwrap_or_else(|e| e.into_inner()) = sink;
    }

    /// Forward one hotkey event. Returns `true` when a listener received it.
    pub(crate) fn route(&self, id: u32, state: HotKeyState) -> bool {
        if state != HotKeyState::Pressed {
            return false;
        }

        let sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        match sink.as_ref() {
            Some(sink) if sink.send(id).is_ok() => true,
            Some(_) => {
                debug!(id, "Listener has exited, dropping press");
                false
            }
            None => {
                trace!(id, "Hotkeys inactive, dropping press");
                false
            }
        }
    }
}

/// [`HotkeyHook`] backed by the `global-hotkey` manager.
///
/// Must be created and used on a thread with a message pump (the main thread
/// running the `tao` event loop) so that `WM_HOTKEY` messages are dispatched
/// on Windows.
pub struct GlobalHotkeyHook {
    manager: GlobalHotKeyManager,
}

impl GlobalHotkeyHook {
    /// Create the OS hotkey manager.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let manager =
            GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyListenerFailed {
                reason: format!("Failed to create manager: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        HANDLER_INSTALLED.call_once(|| {
            GlobalHotKeyEvent::set_event_handler(Some(|event: GlobalHotKeyEvent| {
                ROUTER.route(event.id, event.state);
            }));
        });

        Ok(Self { manager })
    }
}

impl HotkeyHook for GlobalHotkeyHook {
    #[track_caller]
    fn arm(&mut self, shortcut: &Shortcut) -> AppResult<u32> {
        let hotkey = shortcut.to_hotkey();

        self.manager
            .register(hotkey)
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: describe(&e, shortcut),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!(shortcut = %shortcut, id = hotkey.id(), "Hotkey registered");
        Ok(hotkey.id())
    }

    #[track_caller]
    fn disarm(&mut self, shortcut: &Shortcut) -> AppResult<()> {
        self.manager
            .unregister(shortcut.to_hotkey())
            .map_err(|e| AppError::HotkeyRegistrationFailed {
                reason: format!("Failed to unregister '{}': {}", shortcut, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn forward_events(&mut self, sink: Option<mpsc::UnboundedSender<u32>>) -> AppResult<()> {
        ROUTER.replace(sink);
        Ok(())
    }
}

fn describe(error: &HotkeyError, shortcut: &Shortcut) -> String {
    match error {
        HotkeyError::AlreadyRegistered(_) => {
            format!("'{}' is already registered by another application", shortcut)
        }
        HotkeyError::FailedToRegister(msg) => {
            format!("System rejected '{}': {}", shortcut, msg)
        }
        HotkeyError::OsError(os_err) => {
            format!("OS error registering '{}': {}", shortcut, os_err)
        }
        other => format!("Failed to register '{}': {}", shortcut, other),
    }
}
