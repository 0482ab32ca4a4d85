//! System tray icon with state-based updates.
//!
//! Shows whether hotkeys are armed and offers per-application quick
//! controls. The menu is rebuilt whenever the set of live applications or
//! the engine state changes.

use crate::{AppError, AppResult, TrayAction, TrayIconState};

use std::{collections::HashMap, panic::Location};

use error_location::ErrorLocation;
use hotvolume_core::{AppIdentity, VolumeAction};
use tracing::{debug, info, instrument};
use tray_icon::menu::{IsMenuItem, Menu, MenuId, MenuItem, PredefinedMenuItem, Submenu};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const QUICK_ACTIONS: [(&str, VolumeAction); 3] = [
    ("Volume Up", VolumeAction::Increase),
    ("Volume Down", VolumeAction::Decrease),
    ("Toggle Mute", VolumeAction::ToggleMute),
];

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    actions: HashMap<MenuId, TrayAction>,
}

impl TrayManager {
    /// Create the tray icon with an initial menu.
    #[track_caller]
    #[instrument]
    pub fn new(state: TrayIconState) -> AppResult<Self> {
        let (menu, actions) = Self::build_menu(&[], state)?;
        let icon = Self::load_icon(state)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(Self::tooltip(state))
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self { tray_icon, actions })
    }

    /// Replace the menu for a new set of applications and engine state.
    #[track_caller]
    #[instrument(skip(self, apps), fields(apps = apps.len()))]
    pub fn rebuild_menu(&mut self, apps: &[AppIdentity], state: TrayIconState) -> AppResult<()> {
        let (menu, actions) = Self::build_menu(apps, state)?;
        self.tray_icon.set_menu(Some(Box::new(menu)));
        self.actions = actions;
        debug!("Tray menu rebuilt");
        Ok(())
    }

    /// Update the tray icon state with new icon and tooltip.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn update_state(&mut self, state: TrayIconState) -> AppResult<()> {
        self.tray_icon
            .set_icon(Some(Self::load_icon(state)?))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.tray_icon
            .set_tooltip(Some(Self::tooltip(state)))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        Ok(())
    }

    /// Action bound to a clicked menu item.
    pub fn resolve(&self, id: &MenuId) -> Option<TrayAction> {
        self.actions.get(id).cloned()
    }

    fn tooltip(state: TrayIconState) -> &'static str {
        match state {
            TrayIconState::Active => "HotVolume - Hotkeys active",
            TrayIconState::Inactive => "HotVolume - Hotkeys inactive",
        }
    }

    #[track_caller]
    fn build_menu(apps: &[AppIdentity], state: TrayIconState) -> AppResult<(Menu, HashMap<MenuId, TrayAction>)> {
        let menu = Menu::new();
        let mut actions = HashMap::new();

        let quick_controls = Submenu::new("Quick Controls", true);
        if apps.is_empty() {
            append(&quick_controls, &MenuItem::new("No applications playing audio", false, None))?;
        }
        for app in apps {
            let app_menu = Submenu::new(app.as_str(), true);
            for (label, action) in QUICK_ACTIONS {
                let item = MenuItem::new(label, true, None);
                append(&app_menu, &item)?;
                actions.insert(
                    item.id().clone(),
                    TrayAction::QuickControl {
                        app: app.clone(),
                        action,
                    },
                );
            }
            append(&quick_controls, &app_menu)?;
        }
        append(&menu, &quick_controls)?;

        let refresh = MenuItem::new("Refresh Apps", true, None);
        append(&menu, &refresh)?;
        actions.insert(refresh.id().clone(), TrayAction::RefreshApps);

        append(&menu, &PredefinedMenuItem::separator())?;

        let toggle_label = match state {
            TrayIconState::Active => "Hotkeys: Active (click to disable)",
            TrayIconState::Inactive => "Hotkeys: Inactive (click to enable)",
        };
        let toggle = MenuItem::new(toggle_label, true, None);
        append(&menu, &toggle)?;
        actions.insert(toggle.id().clone(), TrayAction::ToggleHotkeys);

        let reload = MenuItem::new("Reload Mappings", true, None);
        append(&menu, &reload)?;
        actions.insert(reload.id().clone(), TrayAction::ReloadMappings);

        let open_file = MenuItem::new("Open Mappings File", true, None);
        append(&menu, &open_file)?;
        actions.insert(open_file.id().clone(), TrayAction::OpenMappingsFile);

        append(&menu, &PredefinedMenuItem::separator())?;

        let exit = MenuItem::new("Exit", true, None);
        append(&menu, &exit)?;
        actions.insert(exit.id().clone(), TrayAction::Exit);

        Ok((menu, actions))
    }

    /// Load icon from compile-time embedded PNG bytes.
    ///
    /// Icons are embedded via include_bytes! so they work regardless of
    /// install location.
    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        let png_bytes: &[u8] = match state {
            TrayIconState::Active => include_bytes!("../resources/icons/active.png"),
            TrayIconState::Inactive => include_bytes!("../resources/icons/inactive.png"),
        };

        let img = image::load_from_memory(png_bytes).map_err(|e| AppError::TrayError {
            reason: format!("Failed to decode embedded icon: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let rgba = img.into_rgba8();
        let (width, height) = (rgba.width(), rgba.height());

        Icon::from_rgba(rgba.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

/// Menu and submenu share `append`, but not through a common trait.
trait MenuContainer {
    fn append_item(&self, item: &dyn IsMenuItem) -> tray_icon::menu::Result<()>;
}

impl MenuContainer for Menu {
    fn append_item(&self, item: &dyn IsMenuItem) -> tray_icon::menu::Result<()> {
        self.append(item)
    }
}

impl MenuContainer for Submenu {
    fn append_item(&self, item: &dyn IsMenuItem) -> tray_icon::menu::Result<()> {
        self.append(item)
    }
}

#[track_caller]
fn append(container: &impl MenuContainer, item: &dyn IsMenuItem) -> AppResult<()> {
    container.append_item(item).map_err(|e| AppError::TrayError {
        reason: format!("Failed to build menu: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })
}
