mod defaults;
mod shortcut;
mod shortcut_mapping;
mod store;

pub(crate) use {
    defaults::default_mappings,
    shortcut::Shortcut,
    shortcut_mapping::ShortcutMapping,
    store::{DefaultReason, LoadOutcome, MappingStore, RemoveOutcome},
};
