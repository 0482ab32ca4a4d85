//! Durable shortcut → action table.
//!
//! The table lives in one TOML file:
//!
//! ```toml
//! version = 1
//!
//! [mappings."ctrl+shift+f1"]
//! app = "spotify.exe"
//! action = "decrease"
//! step = 0.1
//! ```
//!
//! Every mutation is written through to disk while the table lock is held,
//! so concurrent add/remove calls can never interleave their writes.

use crate::{
    AppError, AppResult, atomic_write,
    mapping::{Shortcut, ShortcutMapping, default_mappings},
};

use std::{
    collections::BTreeMap,
    fs, io,
    panic::Location,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use hotvolume_core::{
    AppIdentity, VolumeAction,
    volume::{DEFAULT_STEP, validate_step},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct MappingFile {
    version: u32,
    #[serde(default)]
    mappings: BTreeMap<String, MappingRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MappingRecord {
    app: String,
    action: VolumeAction,
    #[serde(default = "default_step")]
    step: f64,
}

fn default_step() -> f64 {
    DEFAULT_STEP
}

/// Why the default table was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultReason {
    /// No mapping file existed.
    Missing,
    /// The file could not be read or parsed. Holds the parse error.
    Corrupt(String),
}

/// Result of [`MappingStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The file was read.
    Loaded {
        /// Mappings now in the table.
        mappings: usize,
        /// Entries dropped because they failed validation.
        skipped: usize,
    },
    /// The default table replaced a missing or corrupt file.
    Defaulted {
        /// Why defaults were used.
        reason: DefaultReason,
        /// Whether the defaults were written back to disk.
        persisted: bool,
    },
}

/// Result of [`MappingStore::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    /// The mapping existed and was removed.
    Removed(ShortcutMapping),
    /// No mapping is bound to the shortcut.
    NotPresent,
}

/// Single owner of the mapping table and its file.
#[derive(Debug)]
pub struct MappingStore {
    path: PathBuf,
    table: Mutex<BTreeMap<Shortcut, ShortcutMapping>>,
}

impl MappingStore {
    /// Create a store backed by `path`. The table stays empty until [`load`](Self::load).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(BTreeMap::new()),
        }
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory table with the file's contents.
    ///
    /// A missing or corrupt file installs the default table and writes it
    /// back; a corrupt file is first preserved next to the original with a
    /// `.corrupt` suffix. Never fails: losing the file degrades to defaults.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn load(&self) -> LoadOutcome {
        let mut table = self.lock();

        let reason = match fs::read_to_string(&self.path) {
            Ok(contents) => match parse_table(&contents) {
                Ok((parsed, skipped)) => {
                    let mappings = parsed.len();
                    *table = parsed;
                    info!(mappings, skipped, "Mappings loaded");
                    return LoadOutcome::Loaded { mappings, skipped };
                }
                Err(reason) => {
                    warn!(reason = %reason, "Mapping file is corrupt, restoring defaults");
                    self.preserve_corrupt();
                    DefaultReason::Corrupt(reason)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No mapping file found, installing defaults");
                DefaultReason::Missing
            }
            Err(e) => {
                warn!(error = %e, "Mapping file unreadable, restoring defaults");
                DefaultReason::Corrupt(e.to_string())
            }
        };

        *table = default_mappings()
            .into_iter()
            .map(|mapping| (mapping.shortcut.clone(), mapping))
            .collect();

        let persisted = match self.write(&table) {
            Ok(()) => true,
            Err(e) => {
                error!(error = ?e, "Failed to persist default mappings");
                false
            }
        };

        LoadOutcome::Defaulted { reason, persisted }
    }

    /// Write the whole table to disk.
    #[track_caller]
    #[instrument(skip(self), fields(path = ?self.path))]
    pub fn save(&self) -> AppResult<()> {
        let table = self.lock();
        self.write(&table)
    }

    /// Validate and insert a mapping, replacing any mapping on the same shortcut.
    ///
    /// Validation failures leave the table untouched. If the write to disk
    /// fails the error is returned but the new mapping stays in memory;
    /// calling [`save`](Self::save) later retries the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn add(&self, shortcut: &str, app: &str, action: &str, step: f64) -> AppResult<ShortcutMapping> {
        let mapping = validate(shortcut, app, action, step)?;

        let mut table = self.lock();
        if let Some(previous) = table.insert(mapping.shortcut.clone(), mapping.clone()) {
            debug!(previous = %previous, "Replacing existing mapping");
        }
        self.write(&table)?;

        info!(mapping = %mapping, "Mapping added");
        Ok(mapping)
    }

    /// Remove the mapping bound to `shortcut`.
    #[track_caller]
    #[instrument(skip(self), fields(shortcut = %shortcut))]
    pub fn remove(&self, shortcut: &Shortcut) -> AppResult<RemoveOutcome> {
        let mut table = self.lock();
        let Some(removed) = table.remove(shortcut) else {
            debug!("No mapping to remove");
            return Ok(RemoveOutcome::NotPresent);
        };
        self.write(&table)?;

        info!(mapping = %removed, "Mapping removed");
        Ok(RemoveOutcome::Removed(removed))
    }

    /// Mapping bound to `shortcut`, if any.
    pub fn get(&self, shortcut: &Shortcut) -> Option<ShortcutMapping> {
        self.lock().get(shortcut).cloned()
    }

    /// All mappings in shortcut order.
    pub fn mappings(&self) -> Vec<ShortcutMapping> {
        self.lock().values().cloned().collect()
    }

    /// All bound shortcuts.
    pub fn shortcuts(&self) -> Vec<Shortcut> {
        self.lock().keys().cloned().collect()
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when no mapping exists.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Shortcut, ShortcutMapping>> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[track_caller]
    fn write(&self, table: &BTreeMap<Shortcut, ShortcutMapping>) -> AppResult<()> {
        let file = MappingFile {
            version: FORMAT_VERSION,
            mappings: table
                .values()
                .map(|m| {
                    (
                        m.shortcut.to_string(),
                        MappingRecord {
                            app: m.app.to_string(),
                            action: m.action,
                            step: m.step,
                        },
                    )
                })
                .collect(),
        };

        let contents = toml::to_string_pretty(&file).map_err(|e| AppError::PersistenceFailed {
            path: self.path.clone(),
            reason: format!("Failed to serialize mappings: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        atomic_write::write_atomic(&self.path, &contents)?;

        debug!(mappings = table.len(), "Mappings saved (atomic write)");
        Ok(())
    }

    fn preserve_corrupt(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");

        match fs::copy(&self.path, &backup) {
            Ok(_) => info!(backup = ?backup, "Corrupt mapping file preserved"),
            Err(e) => warn!(error = %e, "Failed to preserve corrupt mapping file"),
        }
    }
}

/// Parse file contents into a table.
///
/// Structural problems (bad TOML, unknown action, wrong version) reject the
/// whole file. Entries with an unparseable shortcut, empty application or
/// invalid step are skipped and counted.
fn parse_table(contents: &str) -> Result<(BTreeMap<Shortcut, ShortcutMapping>, usize), String> {
    let file: MappingFile = toml::from_str(contents).map_err(|e| e.to_string())?;

    if file.version != FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (expected {FORMAT_VERSION})",
            file.version
        ));
    }

    let mut table = BTreeMap::new();
    let mut skipped = 0;

    for (key, record) in file.mappings {
        match validate_record(&key, record) {
            Ok(mapping) => {
                table.insert(mapping.shortcut.clone(), mapping);
            }
            Err(e) => {
                warn!(shortcut = %key, error = %e, "Skipping invalid mapping entry");
                skipped += 1;
            }
        }
    }

    Ok((table, skipped))
}

fn validate_record(key: &str, record: MappingRecord) -> AppResult<ShortcutMapping> {
    build(key.parse()?, &record.app, record.action, record.step)
}

#[track_caller]
fn validate(shortcut: &str, app: &str, action: &str, step: f64) -> AppResult<ShortcutMapping> {
    let shortcut: Shortcut = shortcut.parse()?;
    let action: VolumeAction = action.parse().map_err(|e| AppError::InvalidMapping {
        reason: format!("{e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;
    build(shortcut, app, action, step)
}

/// Stepping actions must carry a valid step. Other actions keep a valid
/// step as given and fall back to the default otherwise.
#[track_caller]
fn build(shortcut: Shortcut, app: &str, action: VolumeAction, step: f64) -> AppResult<ShortcutMapping> {
    let app = AppIdentity::new(app);
    if app.is_empty() {
        return Err(AppError::InvalidMapping {
            reason: "application name is empty".to_string(),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    let step = match validate_step(step) {
        Ok(step) => step,
        Err(e) if action.uses_step() => {
            return Err(AppError::InvalidMapping {
                reason: format!("{e}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Err(_) => DEFAULT_STEP,
    };

    Ok(ShortcutMapping {
        shortcut,
        app,
        action,
        step,
    })
}
