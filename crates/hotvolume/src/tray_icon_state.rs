/// Tray icon states mirroring whether hotkeys are armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Hotkeys are armed and dispatching.
    Active,
    /// Hotkeys are disarmed; quick controls still work.
    Inactive,
}

impl TrayIconState {
    /// State matching the engine's running flag.
    pub fn from_running(running: bool) -> Self {
        if running {
            TrayIconState::Active
        } else {
            TrayIconState::Inactive
        }
    }
}
