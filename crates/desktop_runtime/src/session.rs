//! Headless workspace session: the reducer, the persistence adapter, and window resources behind
//! one object with a method per user gesture.
//!
//! Every gesture is one synchronous transition on a cloned state, committed only on success, then
//! followed by the write-through of whichever records changed. Rejected gestures are logged and
//! leave the workspace untouched.

use leptos::logging;
use platform_host::PrefsStore;

use crate::{
    component_registry::{resolve_window_content, ComponentResolver, WindowContent},
    config::WorkspaceConfig,
    model::{AppRegistration, DesktopState, ItemId, ItemKind, WindowId},
    persistence::{flush_pending_writes, load_boot_snapshot, PendingWrites},
    reducer::{reduce_desktop, DesktopAction, ReducerError, RuntimeEffect},
    taskbar::{taskbar_entries, TaskbarEntry},
    window_resources::{TimerHandle, WindowResourceTable},
};

/// A desktop workspace bound to one preference store.
pub struct WorkspaceSession<S: PrefsStore> {
    store: S,
    config: WorkspaceConfig,
    state: DesktopState,
    resources: WindowResourceTable,
}

impl<S: PrefsStore> WorkspaceSession<S> {
    /// Creates an empty session. Call [`WorkspaceSession::boot`] to load persisted records.
    pub fn new(store: S, config: WorkspaceConfig) -> Self {
        Self {
            store,
            config,
            state: DesktopState::default(),
            resources: WindowResourceTable::default(),
        }
    }

    /// Hydrates from the store, seeding the configured catalog when no items record exists.
    pub async fn boot(&mut self) {
        let boot = load_boot_snapshot(&self.store, &self.config).await;
        self.apply(DesktopAction::HydrateSnapshot {
            snapshot: boot.snapshot,
        })
        .await;

        if boot.first_boot && !self.config.seed_apps.is_empty() {
            logging::log!(
                "seeding {} catalog apps on first boot",
                self.config.seed_apps.len()
            );
            let apps = self.config.seed_apps.clone();
            self.apply(DesktopAction::SeedCatalog { apps }).await;
        }
    }

    /// Cancels every window-scoped resource. Persisted records are left as they are.
    pub fn teardown(&mut self) -> usize {
        self.resources.release_all()
    }

    pub fn state(&self) -> &DesktopState {
        &self.state
    }

    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs `action`, logging and discarding rejections.
    ///
    /// Returns the effects left for the rendering layer, such as input focus requests.
    pub async fn apply(&mut self, action: DesktopAction) -> Vec<RuntimeEffect> {
        match self.try_apply(action).await {
            Ok(effects) => effects,
            Err(err) => {
                logging::warn!("desktop reducer error ({:?}): {err}", err.class());
                Vec::new()
            }
        }
    }

    /// Runs `action`, returning the rejection instead of logging it.
    ///
    /// # Errors
    ///
    /// Returns the [`ReducerError`] for actions naming missing or misplaced items and windows.
    /// The state is unchanged in that case.
    pub async fn try_apply(
        &mut self,
        action: DesktopAction,
    ) -> Result<Vec<RuntimeEffect>, ReducerError> {
        let mut next = self.state.clone();
        let effects = reduce_desktop(&mut next, action)?;
        Ok(self.commit(next, effects).await)
    }

    async fn commit(
        &mut self,
        next: DesktopState,
        effects: Vec<RuntimeEffect>,
    ) -> Vec<RuntimeEffect> {
        let windows_changed = next.windows != self.state.windows;
        self.state = next;
        if windows_changed {
            self.resources.sync_windows(self.state.windows.windows());
        }

        let writes = PendingWrites::capture(&self.state, &effects);
        if !writes.is_empty() {
            // The committed state stands even when a write fails.
            for err in flush_pending_writes(&self.store, &self.config.storage, writes).await {
                logging::warn!("desktop persistence error: {err}");
            }
        }

        effects
            .into_iter()
            .filter(|effect| match effect {
                RuntimeEffect::PersistItems | RuntimeEffect::PersistWindows => false,
                RuntimeEffect::ReleaseWindowResources(window_id) => {
                    self.resources.release(*window_id);
                    false
                }
                RuntimeEffect::FocusWindowInput(_) => true,
            })
            .collect()
    }

    async fn gesture(&mut self, action: DesktopAction) -> bool {
        match self.try_apply(action).await {
            Ok(_) => true,
            Err(err) => {
                logging::warn!("desktop reducer error ({:?}): {err}", err.class());
                false
            }
        }
    }

    /// Appends a new empty folder and returns its id.
    pub async fn create_folder(&mut self, name: impl Into<String>) -> Option<ItemId> {
        let name = name.into();
        if !self.gesture(DesktopAction::CreateFolder { name }).await {
            return None;
        }
        self.state.items.items().last().map(|item| item.id().clone())
    }

    pub async fn delete_folder(&mut self, folder_id: &ItemId) -> bool {
        self.gesture(DesktopAction::DeleteFolder {
            folder_id: folder_id.clone(),
        })
        .await
    }

    pub async fn add_app_to_folder(&mut self, folder_id: &ItemId, app_id: &ItemId) -> bool {
        self.gesture(DesktopAction::AddAppToFolder {
            folder_id: folder_id.clone(),
            app_id: app_id.clone(),
        })
        .await
    }

    pub async fn remove_app_from_folder(&mut self, folder_id: &ItemId, app_id: &ItemId) -> bool {
        self.gesture(DesktopAction::RemoveAppFromFolder {
            folder_id: folder_id.clone(),
            app_id: app_id.clone(),
        })
        .await
    }

    pub async fn move_to_recent(&mut self, item_id: &ItemId) -> bool {
        self.gesture(DesktopAction::MoveToRecent {
            item_id: item_id.clone(),
        })
        .await
    }

    /// Registers an app in the provisioning state.
    pub async fn register_app(&mut self, registration: AppRegistration) -> bool {
        self.gesture(DesktopAction::RegisterApp(registration)).await
    }

    /// Removes a top-level app. Windows showing it become orphaned rather than closing.
    pub async fn unregister_app(&mut self, item_id: &ItemId) -> bool {
        self.gesture(DesktopAction::UnregisterApp {
            item_id: item_id.clone(),
        })
        .await
    }

    pub async fn finish_provisioning(&mut self, item_id: &ItemId) -> bool {
        self.gesture(DesktopAction::FinishProvisioning {
            item_id: item_id.clone(),
        })
        .await
    }

    pub async fn rename_item(&mut self, item_id: &ItemId, name: impl Into<String>) -> bool {
        self.gesture(DesktopAction::RenameItem {
            item_id: item_id.clone(),
            name: name.into(),
        })
        .await
    }

    /// Opens a window for `item_id`, or brings its existing window forward.
    pub async fn open(&mut self, item_id: &ItemId, kind: ItemKind) -> Option<WindowId> {
        let opened = self
            .gesture(DesktopAction::OpenWindow {
                item_id: item_id.clone(),
                kind,
            })
            .await;
        if !opened {
            return None;
        }
        self.state.windows.window_for_item(item_id).map(|win| win.id)
    }

    /// Opens a window for a registered item, taking its kind from the registry.
    pub async fn open_item(&mut self, item_id: &ItemId) -> Option<WindowId> {
        let Some(kind) = self.state.items.kind_of(item_id) else {
            logging::warn!("open ignored: item `{item_id}` not found");
            return None;
        };
        self.open(item_id, kind).await
    }

    pub async fn focus(&mut self, window_id: WindowId) -> bool {
        self.gesture(DesktopAction::FocusWindow { window_id }).await
    }

    pub async fn minimize(&mut self, window_id: WindowId) -> bool {
        self.gesture(DesktopAction::MinimizeWindow { window_id }).await
    }

    pub async fn restore(&mut self, window_id: WindowId) -> bool {
        self.gesture(DesktopAction::RestoreWindow { window_id }).await
    }

    pub async fn close(&mut self, window_id: WindowId) -> bool {
        self.gesture(DesktopAction::CloseWindow { window_id }).await
    }

    pub async fn toggle_taskbar_window(&mut self, window_id: WindowId) -> bool {
        self.gesture(DesktopAction::ToggleTaskbarWindow { window_id }).await
    }

    /// Closes windows whose items were removed and returns how many closed.
    pub async fn close_orphaned_windows(&mut self) -> usize {
        let before = self.state.windows.windows().len();
        self.apply(DesktopAction::CloseOrphanedWindows).await;
        before - self.state.windows.windows().len()
    }

    /// Scopes `timer` to `window_id`. A timer for a window that is not open is cancelled at once.
    pub fn attach_timer(&mut self, window_id: WindowId, timer: TimerHandle) -> bool {
        if self.state.windows.get(window_id).is_none() {
            timer.cancel();
            return false;
        }
        self.resources.attach_timer(window_id, timer);
        true
    }

    pub fn timer_count(&self, window_id: WindowId) -> usize {
        self.resources.timer_count(window_id)
    }

    pub fn taskbar_entries(&self) -> Vec<TaskbarEntry> {
        taskbar_entries(&self.state)
    }

    /// Content for an open window, or `None` when the window id is unknown.
    pub fn resolve_window<'a, R>(
        &'a self,
        window_id: WindowId,
        resolver: &impl ComponentResolver<R>,
    ) -> Option<WindowContent<'a, R>> {
        let window = self.state.windows.get(window_id)?;
        Some(resolve_window_content(&self.state, window, resolver))
    }
}
