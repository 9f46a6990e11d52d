//! Reducer actions, side-effect intents, and transition logic for the desktop runtime.

use thiserror::Error;

use crate::{
    model::{AppRegistration, DesktopSnapshot, DesktopState, ItemId, ItemKind, WindowId},
    registry::{ErrorClass, RegistryError},
};

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_desktop`] to mutate [`DesktopState`].
pub enum DesktopAction {
    /// Append a new empty folder.
    CreateFolder {
        /// Display name; may be empty or repeat an existing name.
        name: String,
    },
    /// Delete a top-level folder, releasing its members to the top level.
    DeleteFolder {
        /// Folder to delete.
        folder_id: ItemId,
    },
    /// Move a top-level app into a top-level folder.
    AddAppToFolder {
        /// Destination folder.
        folder_id: ItemId,
        /// App to move.
        app_id: ItemId,
    },
    /// Move an app out of its folder to the end of the top level.
    RemoveAppFromFolder {
        /// Folder currently holding the app.
        folder_id: ItemId,
        /// App to release.
        app_id: ItemId,
    },
    /// Move a top-level item to the most-recent slot.
    MoveToRecent {
        /// Item that was interacted with.
        item_id: ItemId,
    },
    /// Register a new app in the provisioning state.
    RegisterApp(AppRegistration),
    /// Remove a top-level app.
    UnregisterApp {
        /// App to remove.
        item_id: ItemId,
    },
    /// Mark a provisioning app as ready.
    FinishProvisioning {
        /// App that finished loading.
        item_id: ItemId,
    },
    /// Change an item's display name.
    RenameItem {
        /// Item to rename.
        item_id: ItemId,
        /// New display name.
        name: String,
    },
    /// Register catalog apps as ready, skipping ids that already exist.
    SeedCatalog {
        /// Apps to add.
        apps: Vec<AppRegistration>,
    },
    /// Open a window for an item, or bring its existing window forward.
    OpenWindow {
        /// Item the window displays.
        item_id: ItemId,
        /// Kind of the item at open time.
        kind: ItemKind,
    },
    /// Raise a window to the front.
    FocusWindow {
        /// Window to raise.
        window_id: WindowId,
    },
    /// Minimize a window to the taskbar.
    MinimizeWindow {
        /// Window to minimize.
        window_id: WindowId,
    },
    /// Unminimize and raise a window.
    RestoreWindow {
        /// Window to restore.
        window_id: WindowId,
    },
    /// Close a window.
    CloseWindow {
        /// Window to close.
        window_id: WindowId,
    },
    /// Taskbar button click: restore, minimize, or focus depending on current state.
    ToggleTaskbarWindow {
        /// Window associated with the taskbar button.
        window_id: WindowId,
    },
    /// Close windows whose items were removed.
    CloseOrphanedWindows,
    /// Replace runtime state with persisted records.
    HydrateSnapshot {
        /// Records loaded at boot.
        snapshot: DesktopSnapshot,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Side-effect intents emitted by [`reduce_desktop`] for the session to execute.
pub enum RuntimeEffect {
    /// Write the items record.
    PersistItems,
    /// Write the windows record.
    PersistWindows,
    /// Cancel timers and other resources scoped to a closed window.
    ReleaseWindowResources(WindowId),
    /// Move keyboard focus into the frontmost window's content.
    FocusWindowInput(WindowId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Reducer errors for actions that reference missing or misplaced entities.
pub enum ReducerError {
    /// A registry operation was rejected.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The target window id was not found in the current state.
    #[error("window {0} not found")]
    WindowNotFound(WindowId),
}

impl ReducerError {
    /// Classification used when logging swallowed errors.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Registry(err) => err.class(),
            Self::WindowNotFound(_) => ErrorClass::NotFound,
        }
    }
}

/// Applies a [`DesktopAction`] to the desktop state and collects resulting side effects.
///
/// On error the state is left as it was; every action validates before mutating.
///
/// # Errors
///
/// Returns [`ReducerError`] when the action references an item or window that is absent or in
/// the wrong container. Callers at the UI boundary log these and carry on.
pub fn reduce_desktop(
    state: &mut DesktopState,
    action: DesktopAction,
) -> Result<Vec<RuntimeEffect>, ReducerError> {
    let mut effects = Vec::new();
    match action {
        DesktopAction::CreateFolder { name } => {
            state.items.create_folder(name);
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::DeleteFolder { folder_id } => {
            state.items.delete_folder(&folder_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::AddAppToFolder { folder_id, app_id } => {
            state.items.add_app_to_folder(&folder_id, &app_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::RemoveAppFromFolder { folder_id, app_id } => {
            state.items.remove_app_from_folder(&folder_id, &app_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::MoveToRecent { item_id } => {
            state.items.move_to_recent(&item_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::RegisterApp(registration) => {
            state.items.register_app(registration)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::UnregisterApp { item_id } => {
            state.items.unregister_app(&item_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::FinishProvisioning { item_id } => {
            state.items.finish_provisioning(&item_id)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::RenameItem { item_id, name } => {
            state.items.rename_item(&item_id, name)?;
            effects.push(RuntimeEffect::PersistItems);
        }
        DesktopAction::SeedCatalog { apps } => {
            let mut added = false;
            for app in apps {
                added |= state.items.register_ready_app(app).is_ok();
            }
            if added {
                effects.push(RuntimeEffect::PersistItems);
            }
        }
        DesktopAction::OpenWindow { item_id, kind } => {
            let window_id = state.windows.open(&item_id, kind);
            effects.push(RuntimeEffect::PersistWindows);
            effects.push(RuntimeEffect::FocusWindowInput(window_id));
        }
        DesktopAction::FocusWindow { window_id } => {
            if !state.windows.focus(window_id) {
                return Err(ReducerError::WindowNotFound(window_id));
            }
            effects.push(RuntimeEffect::PersistWindows);
            effects.push(RuntimeEffect::FocusWindowInput(window_id));
        }
        DesktopAction::MinimizeWindow { window_id } => {
            if !state.windows.minimize(window_id) {
                return Err(ReducerError::WindowNotFound(window_id));
            }
            effects.push(RuntimeEffect::PersistWindows);
        }
        DesktopAction::RestoreWindow { window_id } => {
            if !state.windows.restore(window_id) {
                return Err(ReducerError::WindowNotFound(window_id));
            }
            effects.push(RuntimeEffect::PersistWindows);
            effects.push(RuntimeEffect::FocusWindowInput(window_id));
        }
        DesktopAction::CloseWindow { window_id } => {
            state
                .windows
                .close(window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            effects.push(RuntimeEffect::PersistWindows);
            effects.push(RuntimeEffect::ReleaseWindowResources(window_id));
        }
        DesktopAction::ToggleTaskbarWindow { window_id } => {
            state
                .windows
                .toggle_taskbar(window_id)
                .ok_or(ReducerError::WindowNotFound(window_id))?;
            effects.push(RuntimeEffect::PersistWindows);
            if let Some(focused) = state.windows.focused_window_id() {
                effects.push(RuntimeEffect::FocusWindowInput(focused));
            }
        }
        DesktopAction::CloseOrphanedWindows => {
            let closed = state.windows.close_orphans(&state.items);
            if !closed.is_empty() {
                effects.push(RuntimeEffect::PersistWindows);
                effects.extend(
                    closed
                        .iter()
                        .map(|w| RuntimeEffect::ReleaseWindowResources(w.id)),
                );
            }
        }
        DesktopAction::HydrateSnapshot { snapshot } => {
            let restored = DesktopState::from_snapshot(snapshot.clone());
            // Persist only the records hydration had to repair.
            if restored.items.items() != snapshot.items.as_slice() {
                effects.push(RuntimeEffect::PersistItems);
            }
            if restored.windows.windows() != snapshot.windows.as_slice() {
                effects.push(RuntimeEffect::PersistWindows);
            }
            *state = restored;
        }
    }

    Ok(effects)
}
