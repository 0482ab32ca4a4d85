use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};

/// Case-normalized executable name grouping the endpoints of one application.
///
/// `Spotify.exe`, ` spotify.exe ` and `SPOTIFY.EXE` all resolve to the same
/// identity, `spotify.exe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct AppIdentity(String);

impl AppIdentity {
    /// Normalize an executable name into an identity.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_lowercase())
    }

    /// Build an identity from the file name of an executable path.
    ///
    /// Accepts both `\` and `/` separators regardless of host platform, since
    /// process image paths are reported in the OS's native form.
    pub fn from_executable_path(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy();
        Self::new(Self::executable_name(&raw))
    }

    /// File name part of an executable path, case preserved.
    ///
    /// Empty when the path ends in a separator.
    pub fn executable_name(path: &str) -> &str {
        path.rsplit(['\\', '/']).next().unwrap_or_default()
    }

    /// The normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the normalized name is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for AppIdentity {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for AppIdentity {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<AppIdentity> for String {
    fn from(identity: AppIdentity) -> Self {
        identity.0
    }
}
