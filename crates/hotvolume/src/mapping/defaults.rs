use crate::mapping::ShortcutMapping;

use hotvolume_core::{AppIdentity, VolumeAction, volume::DEFAULT_STEP};

const DEFAULT_TABLE: [(&str, &str, VolumeAction); 9] = [
    ("ctrl+shift+f1", "spotify.exe", VolumeAction::Decrease),
    ("ctrl+shift+f2", "spotify.exe", VolumeAction::Increase),
    ("ctrl+shift+f3", "spotify.exe", VolumeAction::ToggleMute),
    ("ctrl+shift+f4", "chrome.exe", VolumeAction::Decrease),
    ("ctrl+shift+f5", "chrome.exe", VolumeAction::Increase),
    ("ctrl+shift+f6", "chrome.exe", VolumeAction::ToggleMute),
    ("ctrl+shift+f7", "discord.exe", VolumeAction::Decrease),
    ("ctrl+shift+f8", "discord.exe", VolumeAction::Increase),
    ("ctrl+shift+f9", "discord.exe", VolumeAction::ToggleMute),
];

/// Table used when the mapping file is missing or unreadable.
pub fn default_mappings() -> Vec<ShortcutMapping> {
    DEFAULT_TABLE
        .iter()
        .filter_map(|&(shortcut, app, action)| {
            Some(ShortcutMapping {
                shortcut: shortcut.parse().ok()?,
                app: AppIdentity::new(app),
                action,
                step: DEFAULT_STEP,
            })
        })
        .collect()
}
