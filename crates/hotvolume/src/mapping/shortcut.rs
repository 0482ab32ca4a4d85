//! Key combination grammar.
//!
//! A shortcut is written as `+`-separated tokens, any number of modifiers
//! followed by exactly one key, e.g. `ctrl+shift+f1`. Tokens are
//! case-insensitive and surrounding whitespace is ignored. The canonical form
//! is lower-case with modifiers ordered ctrl, alt, shift, super.

use crate::{AppError, AppResult};

use std::{cmp::Ordering, fmt, hash, panic::Location, str::FromStr};

use error_location::ErrorLocation;
use global_hotkey::hotkey::{Code, HotKey, Modifiers};

/// Modifier key of a shortcut. Declaration order is the canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    /// Control.
    Ctrl,
    /// Alt / Option.
    Alt,
    /// Shift.
    Shift,
    /// Windows / Command / Meta.
    Super,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "super" | "win" | "cmd" | "command" | "meta" => Some(Modifier::Super),
            _ => None,
        }
    }

    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Alt => "alt",
            Modifier::Shift => "shift",
            Modifier::Super => "super",
        }
    }

    fn flag(&self) -> Modifiers {
        match self {
            Modifier::Ctrl => Modifiers::CONTROL,
            Modifier::Alt => Modifiers::ALT,
            Modifier::Shift => Modifiers::SHIFT,
            Modifier::Super => Modifiers::SUPER,
        }
    }
}

/// Non-modifier key of a shortcut. Compared by its canonical name.
#[derive(Debug, Clone, Copy)]
pub struct Key {
    name: &'static str,
    code: Code,
}

impl Key {
    /// Canonical token.
    pub fn as_str(&self) -> &'static str {
        self.name
    }

    fn parse(token: &str) -> Option<Self> {
        let token = match token {
            "esc" => "escape",
            "del" => "delete",
            "ins" => "insert",
            other => other,
        };

        KEYS.iter()
            .find(|(name, _)| *name == token)
            .map(|&(name, code)| Key { name, code })
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name)
    }
}

impl hash::Hash for Key {
    fn hash<H: hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// A parsed key combination in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Shortcut {
    modifiers: Vec<Modifier>,
    key: Key,
}

impl Shortcut {
    /// Modifiers in canonical order, without duplicates.
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// The non-modifier key.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Hotkey registration for the OS hook.
    pub fn to_hotkey(&self) -> HotKey {
        let modifiers = self
            .modifiers
            .iter()
            .fold(Modifiers::empty(), |acc, m| acc | m.flag());

        let modifiers = (!modifiers.is_empty()).then_some(modifiers);
        HotKey::new(modifiers, self.key.code)
    }

    /// Id the OS hook reports when this shortcut is pressed.
    pub fn hotkey_id(&self) -> u32 {
        self.to_hotkey().id()
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier.as_str())?;
        }
        f.write_str(self.key.name)
    }
}

impl FromStr for Shortcut {
    type Err = AppError;

    #[track_caller]
    fn from_str(s: &str) -> AppResult<Self> {
        let invalid = |reason: String| AppError::InvalidShortcut {
            shortcut: s.to_string(),
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(invalid("shortcut is empty".to_string()));
        }

        let mut modifiers = Vec::new();
        let mut key = None;

        for token in normalized.split('+').map(str::trim) {
            if token.is_empty() {
                return Err(invalid("empty token".to_string()));
            }

            if let Some(modifier) = Modifier::parse(token) {
                modifiers.push(modifier);
                continue;
            }

            let parsed = Key::parse(token).ok_or_else(|| invalid(format!("unknown key '{token}'")))?;
            if let Some(existing) = key.replace(parsed) {
                return Err(invalid(format!(
                    "more than one key ('{}' and '{}')",
                    existing.as_str(),
                    parsed.as_str()
                )));
            }
        }

        let key = key.ok_or_else(|| invalid("no key, only modifiers".to_string()))?;

        modifiers.sort();
        modifiers.dedup();

        Ok(Shortcut { modifiers, key })
    }
}

const KEYS: &[(&str, Code)] = &[
    ("a", Code::KeyA),
    ("b", Code::KeyB),
    ("c", Code::KeyC),
    ("d", Code::KeyD),
    ("e", Code::KeyE),
    ("f", Code::KeyF),
    ("g", Code::KeyG),
    ("h", Code::KeyH),
    ("i", Code::KeyI),
    ("j", Code::KeyJ),
    ("k", Code::KeyK),
    ("l", Code::KeyL),
    ("m", Code::KeyM),
    ("n", Code::KeyN),
    ("o", Code::KeyO),
    ("p", Code::KeyP),
    ("q", Code::KeyQ),
    ("r", Code::KeyR),
    ("s", Code::KeyS),
    ("t", Code::KeyT),
    ("u", Code::KeyU),
    ("v", Code::KeyV),
    ("w", Code::KeyW),
    ("x", Code::KeyX),
    ("y", Code::KeyY),
    ("z", Code::KeyZ),
    ("0", Code::Digit0),
    ("1", Code::Digit1),
    ("2", Code::Digit2),
    ("3", Code::Digit3),
    ("4", Code::Digit4),
    ("5", Code::Digit5),
    ("6", Code::Digit6),
    ("7", Code::Digit7),
    ("8", Code::Digit8),
    ("9", Code::Digit9),
    ("f1", Code::F1),
    ("f2", Code::F2),
    ("f3", Code::F3),
    ("f4", Code::F4),
    ("f5", Code::F5),
    ("f6", Code::F6),
    ("f7", Code::F7),
    ("f8", Code::F8),
    ("f9", Code::F9),
    ("f10", Code::F10),
    ("f11", Code::F11),
    ("f12", Code::F12),
    ("f13", Code::F13),
    ("f14", Code::F14),
    ("f15", Code::F15),
    ("f16", Code::F16),
    ("f17", Code::F17),
    ("f18", Code::F18),
    ("f19", Code::F19),
    ("f20", Code::F20),
    ("f21", Code::F21),
    ("f22", Code::F22),
    ("f23", Code::F23),
    ("f24", Code::F24),
    ("space", Code::Space),
    ("enter", Code::Enter),
    ("tab", Code::Tab),
    ("escape", Code::Escape),
    ("backspace", Code::Backspace),
    ("delete", Code::Delete),
    ("insert", Code::Insert),
    ("home", Code::Home),
    ("end", Code::End),
    ("pageup", Code::PageUp),
    ("pagedown", Code::PageDown),
    ("up", Code::ArrowUp),
    ("down", Code::ArrowDown),
    ("left", Code::ArrowLeft),
    ("right", Code::ArrowRight),
    ("minus", Code::Minus),
    ("equal", Code::Equal),
    ("comma", Code::Comma),
    ("period", Code::Period),
    ("slash", Code::Slash),
    ("semicolon", Code::Semicolon),
    ("quote", Code::Quote),
    ("backquote", Code::Backquote),
    ("bracketleft", Code::BracketLeft),
    ("bracketright", Code::BracketRight),
    ("backslash", Code::Backslash),
    ("volumeup", Code::AudioVolumeUp),
    ("volumedown", Code::AudioVolumeDown),
    ("volumemute", Code::AudioVolumeMute),
    ("playpause", Code::MediaPlayPause),
    ("nexttrack", Code::MediaTrackNext),
    ("prevtrack", Code::MediaTrackPrevious),
    ("mediastop", Code::MediaStop),
];
