//! HotVolume: per-application volume control with global hotkeys.

mod app;
mod atomic_write;
mod cli;
mod config;
mod error;
mod hotkey;
mod logging;
mod mapping;
#[cfg(test)]
mod tests;
mod tray_action;
mod tray_icon_state;
mod tray_manager;

pub(crate) use {
    app::{App, AppEvent},
    error::{AppError, Result as AppResult},
    tray_action::TrayAction,
    tray_icon_state::TrayIconState,
    tray_manager::TrayManager,
};

use crate::{
    cli::{Cli, Command},
    config::Config,
    mapping::MappingStore,
};

use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{Arc, Mutex},
};

use clap::Parser;
use tao::{
    event::{Event, StartCause},
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tracing::error;
use tray_icon::menu::MenuEvent;

/// Application entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = Config::log_dir().ok();
    let _log_guard = match logging::init(&config.logging, log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mappings_path = match cli.mappings.map_or_else(Config::mappings_path, Ok) {
        Ok(path) => path,
        Err(e) => {
            error!(error = ?e, "Failed to resolve mappings path");
            return ExitCode::FAILURE;
        }
    };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run_tray(config, mappings_path),
        command => {
            let store = Arc::new(MappingStore::open(mappings_path));
            match cli::execute(command, store, config.behaviour.manual_step) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

/// Run the tray application until Exit is chosen. Never returns.
fn run_tray(config: Config, mappings_path: PathBuf) -> ! {
    let event_loop = EventLoopBuilder::<AppEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    // Menu clicks arrive on whatever thread the tray library uses; forward
    // them into the event loop so `App` handles them on the main thread.
    let menu_proxy = Mutex::new(proxy.clone());
    MenuEvent::set_event_handler(Some(move |event: MenuEvent| {
        if let Ok(proxy) = menu_proxy.lock() {
            let _ = proxy.send_event(AppEvent::Menu(event));
        }
    }));

    let mut config = Some(config);
    let mut app: Option<App> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                let Some(config) = config.take() else {
                    return;
                };

                // App owns the tray icon and hotkey manager, so both stay on
                // the main thread for the lifetime of the event loop.
                match App::new(config, mappings_path.clone(), proxy.clone()) {
                    Ok(created) => app = Some(created),
                    Err(e) => {
                        error!(error = ?e, "Failed to start HotVolume");
                        *control_flow = ControlFlow::ExitWithCode(1);
                        return;
                    }
                }

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }
            }
            Event::UserEvent(event) => {
                if let Some(running) = app.as_mut()
                    && !running.handle_event(event)
                {
                    running.shutdown();
                    *control_flow = ControlFlow::ExitWithCode(0);
                }
            }
            Event::LoopDestroyed => {
                // Stops the engine before the runtime goes away.
                drop(app.take());
            }
            _ => {}
        }
    })
}
