use hotvolume_core::{AppIdentity, VolumeAction};

/// What a tray menu item does when clicked.
///
/// The main thread owns `TrayManager` (because `TrayIcon` is `!Send`), so
/// menu clicks are resolved to one of these and handled by `App` there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayAction {
    /// Run a volume action on one application.
    QuickControl {
        /// Application to adjust.
        app: AppIdentity,
        /// Action to run.
        action: VolumeAction,
    },
    /// Re-enumerate audio sessions and rebuild the menu.
    RefreshApps,
    /// Start or stop the hotkey engine.
    ToggleHotkeys,
    /// Re-read the mapping file.
    ReloadMappings,
    /// Open the mapping file in the default editor.
    OpenMappingsFile,
    /// Stop the engine and leave the event loop.
    Exit,
}
