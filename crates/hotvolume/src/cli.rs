//! Command-line surface.
//!
//! Without a subcommand the tray application starts. The other subcommands
//! edit or inspect the mapping table, or run a single volume action, and
//! exit.

use crate::{
    AppResult,
    hotkey::{DispatchEngine, DispatchOutcome, Dispatcher},
    mapping::{LoadOutcome, MappingStore, RemoveOutcome},
};

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use hotvolume_core::{AppIdentity, FanOut, SessionRegistry, VolumeAction, volume::DEFAULT_STEP};
use tracing::instrument;

/// Per-application volume control with global hotkeys.
#[derive(Debug, Parser)]
#[command(name = "hotvolume", author, version)]
pub struct Cli {
    /// Use this mapping file instead of the one in the config directory.
    #[arg(long, global = true, value_name = "PATH")]
    pub mappings: Option<PathBuf>,

    /// What to do. Defaults to `run`.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the tray application and arm hotkeys.
    Run,
    /// Print every mapping.
    List,
    /// Add or replace a mapping.
    Add {
        /// Key combination, e.g. `ctrl+shift+f1`.
        shortcut: String,
        /// Executable name, e.g. `spotify.exe`.
        app: String,
        /// One of increase, decrease, mute, unmute, toggle_mute.
        action: String,
        /// Step for increase/decrease, within (0.0, 1.0].
        #[arg(long, default_value_t = DEFAULT_STEP)]
        step: f64,
    },
    /// Remove a mapping.
    Remove {
        /// Key combination to unbind.
        shortcut: String,
    },
    /// Run the action bound to a shortcut as if it had been pressed.
    Press {
        /// Key combination to trigger.
        shortcut: String,
    },
    /// Rewrite the mapping file in canonical form, dropping invalid entries.
    Normalize,
    /// Check a key combination without changing anything.
    Check {
        /// Key combination to validate.
        shortcut: String,
    },
    /// List applications currently producing audio.
    Apps,
    /// Run one action against an application now.
    Apply {
        /// Executable name, e.g. `spotify.exe`.
        app: String,
        /// Action to run.
        #[arg(value_parser = parse_action)]
        action: VolumeAction,
        /// Step for increase/decrease. Defaults to `behaviour.manual_step`.
        #[arg(long)]
        step: Option<f64>,
    },
}

fn parse_action(s: &str) -> Result<VolumeAction, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Run a one-shot subcommand. `Run` is handled by the caller.
#[instrument(skip(store))]
pub(crate) fn execute(command: Command, store: Arc<MappingStore>, manual_step: f64) -> AppResult<()> {
    match command {
        Command::Run => Ok(()),
        Command::List => {
            print_load_outcome(&store.load());
            if store.is_empty() {
                println!("No mappings.");
            }
            for mapping in store.mappings() {
                println!("{mapping}");
            }
            Ok(())
        }
        Command::Add {
            shortcut,
            app,
            action,
            step,
        } => {
            store.load();
            let mapping = store.add(&shortcut, &app, &action, step)?;
            println!("Added {mapping}");
            Ok(())
        }
        Command::Remove { shortcut } => {
            store.load();
            let shortcut = DispatchEngine::test_combination(&shortcut)?;
            match store.remove(&shortcut)? {
                RemoveOutcome::Removed(mapping) => println!("Removed {mapping}"),
                RemoveOutcome::NotPresent => println!("No mapping bound to {shortcut}"),
            }
            Ok(())
        }
        Command::Press { shortcut } => {
            print_load_outcome(&store.load());
            let shortcut = DispatchEngine::test_combination(&shortcut)?;
            let dispatcher = Dispatcher::new(Arc::new(SessionRegistry::with_platform_backend()), store);
            match dispatcher.dispatch(&shortcut) {
                DispatchOutcome::Unmapped => {
                    println!("No mapping bound to {shortcut}");
                    Ok(())
                }
                outcome => print_dispatch_outcome(&shortcut.to_string(), outcome),
            }
        }
        Command::Normalize => {
            print_load_outcome(&store.load());
            store.save()?;
            println!("Wrote {} mapping(s) to {:?}", store.len(), store.path());
            Ok(())
        }
        Command::Check { shortcut } => {
            let parsed = DispatchEngine::test_combination(&shortcut)?;
            let modifiers: Vec<&str> = parsed.modifiers().iter().map(|m| m.as_str()).collect();
            println!("{shortcut:?} is valid, canonical form: {parsed}");
            println!("  modifiers: {}", if modifiers.is_empty() { "none".to_string() } else { modifiers.join(", ") });
            println!("  key: {}", parsed.key().as_str());
            Ok(())
        }
        Command::Apps => {
            let registry = SessionRegistry::with_platform_backend();
            let snapshot = registry.refresh();
            if snapshot.is_empty() {
                println!("No applications are producing audio.");
            }
            for identity in snapshot.identities() {
                let volume = registry.get_volume(&identity).ok();
                let muted = registry.get_mute(&identity).ok();
                println!(
                    "{identity:<32} sessions={} volume={} muted={}",
                    snapshot.endpoints(&identity).len(),
                    volume.map_or_else(|| "?".to_string(), |v| format!("{:.0}%", v * 100.0)),
                    muted.map_or_else(|| "?".to_string(), |m| m.to_string()),
                );
            }
            Ok(())
        }
        Command::Apply { app, action, step } => {
            let registry = Arc::new(SessionRegistry::with_platform_backend());
            let dispatcher = Dispatcher::new(registry, store);
            let outcome = dispatcher.apply(&AppIdentity::new(&app), action, step.unwrap_or(manual_step));
            print_dispatch_outcome(&app, outcome)
        }
    }
}

fn print_load_outcome(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Loaded { skipped: 0, .. } => {}
        LoadOutcome::Loaded { skipped, .. } => {
            eprintln!("warning: {skipped} invalid mapping(s) were skipped");
        }
        LoadOutcome::Defaulted { reason, persisted } => {
            eprintln!("note: default mappings installed ({reason:?}, written to disk: {persisted})");
        }
    }
}

fn print_dispatch_outcome(app: &str, outcome: DispatchOutcome) -> AppResult<()> {
    match outcome {
        DispatchOutcome::Applied(result) | DispatchOutcome::Partial(result) => {
            println!("{app}: {result:?}");
            if let FanOut::Partial { failed, .. } = result.fan_out() {
                eprintln!(
                    "warning: {failed} session(s) could not be updated, {} were",
                    result.fan_out().applied()
                );
            }
            Ok(())
        }
        DispatchOutcome::AppNotFound(identity) => {
            println!("{identity} is not producing audio right now");
            Ok(())
        }
        DispatchOutcome::Failed(e) => Err(e.into()),
        DispatchOutcome::Unmapped => Ok(()),
    }
}
