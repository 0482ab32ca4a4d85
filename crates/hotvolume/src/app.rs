use crate::{
    AppResult, TrayAction, TrayIconState, TrayManager,
    config::Config,
    hotkey::{DispatchEngine, Dispatcher, GlobalHotkeyHook},
    mapping::{LoadOutcome, MappingStore},
};

use std::{path::PathBuf, sync::Arc};

use hotvolume_core::{AppIdentity, SessionRegistry, VolumeAction};
use tao::event_loop::EventLoopProxy;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Events delivered to the main thread through the tao event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// A tray menu item was clicked.
    Menu(MenuEvent),
    /// A background refresh finished with these applications.
    SessionsRefreshed(Vec<AppIdentity>),
}

/// Main application state.
///
/// Lives on the main thread: the tray icon is `!Send` and the OS hotkey
/// manager needs the thread that pumps window messages. Audio work runs on
/// the owned tokio runtime's blocking pool and reports back through `proxy`.
pub struct App {
    // Dropped before `runtime`: stopping the engine joins its listener task.
    engine: DispatchEngine,
    tray: TrayManager,
    config: Config,
    apps: Vec<AppIdentity>,
    proxy: EventLoopProxy<AppEvent>,
    runtime: Runtime,
}

impl App {
    /// Build every component, arm hotkeys if configured and show the tray icon.
    ///
    /// Fails only when the runtime, the hotkey listener or the tray icon
    /// cannot be created.
    #[track_caller]
    #[instrument(skip(config, proxy))]
    pub fn new(config: Config, mappings_path: PathBuf, proxy: EventLoopProxy<AppEvent>) -> AppResult<Self> {
        info!("HotVolume starting");

        let runtime = Runtime::new()?;

        let store = Arc::new(MappingStore::open(mappings_path));
        log_load_outcome(&store.load());

        let registry = Arc::new(SessionRegistry::with_platform_backend());
        let hook = GlobalHotkeyHook::new()?;
        let mut engine = DispatchEngine::new(
            Box::new(hook),
            Dispatcher::new(registry, store),
            runtime.handle().clone(),
        );

        if config.behaviour.start_hotkeys_on_launch {
            engine.start()?;
        }

        let tray = TrayManager::new(TrayIconState::from_running(engine.is_running()))?;

        let app = Self {
            engine,
            tray,
            config,
            apps: Vec::new(),
            proxy,
            runtime,
        };
        app.refresh_apps();

        Ok(app)
    }

    /// Handle one event. Returns `false` when the application should exit.
    #[instrument(skip(self))]
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Menu(event) => match self.tray.resolve(&event.id) {
                Some(action) => self.handle_tray_action(action),
                None => {
                    debug!(id = ?event.id, "Menu event for an unknown item");
                    true
                }
            },
            AppEvent::SessionsRefreshed(apps) => {
                self.apps = apps;
                self.rebuild_tray();
                true
            }
        }
    }

    /// Stop the engine. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.engine.stop();
        info!("HotVolume shut down successfully");
    }

    fn handle_tray_action(&mut self, action: TrayAction) -> bool {
        match action {
            TrayAction::QuickControl { app, action } => self.quick_control(app, action),
            TrayAction::RefreshApps => self.refresh_apps(),
            TrayAction::ToggleHotkeys => self.toggle_hotkeys(),
            TrayAction::ReloadMappings => {
                log_load_outcome(&self.engine.reload_mappings());
            }
            TrayAction::OpenMappingsFile => {
                let path = self.engine.store().path().to_path_buf();
                match open::that(&path) {
                    Ok(()) => info!(path = ?path, "Opened mappings file"),
                    Err(e) => error!(path = ?path, error = %e, "Failed to open mappings file"),
                }
            }
            TrayAction::Exit => {
                info!("Exit requested from tray menu");
                return false;
            }
        }
        true
    }

    fn quick_control(&self, app: AppIdentity, action: VolumeAction) {
        let dispatcher = self.engine.dispatcher().clone();
        let step = self.config.behaviour.manual_step;

        self.runtime.spawn_blocking(move || {
            dispatcher.apply(&app, action, step);
        });
    }

    /// Re-enumerate sessions off the main thread and report back.
    fn refresh_apps(&self) {
        let registry = Arc::clone(self.engine.dispatcher().registry());
        let limit = self.config.tray.quick_control_apps;
        let proxy = self.proxy.clone();

        self.runtime.spawn_blocking(move || {
            let mut apps = registry.refresh().identities();
            apps.truncate(limit);
            if proxy.send_event(AppEvent::SessionsRefreshed(apps)).is_err() {
                debug!("Event loop closed before session refresh completed");
            }
        });
    }

    fn toggle_hotkeys(&mut self) {
        if self.engine.is_running() {
            self.engine.stop();
        } else if let Err(e) = self.engine.start() {
            error!(error = ?e, "Failed to start hotkey listener");
        }

        let state = TrayIconState::from_running(self.engine.is_running());
        if let Err(e) = self.tray.update_state(state) {
            warn!(error = ?e, "Failed to update tray icon");
        }
        self.rebuild_tray();
    }

    fn rebuild_tray(&mut self) {
        let state = TrayIconState::from_running(self.engine.is_running());
        if let Err(e) = self.tray.rebuild_menu(&self.apps, state) {
            error!(error = ?e, "Failed to rebuild tray menu");
        }
    }
}

fn log_load_outcome(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Loaded { mappings, skipped } => {
            info!(mappings, skipped, "Mapping table ready");
        }
        LoadOutcome::Defaulted { reason, persisted } => {
            warn!(reason = ?reason, persisted, "Using default mapping table");
        }
    }
}
