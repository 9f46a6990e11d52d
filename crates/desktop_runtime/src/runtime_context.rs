//! Leptos context wiring for the desktop workspace.
//!
//! This module owns the reactive state container, the queue of effects left for the rendering
//! layer, window-scoped resources, and boot hydration. Persistence writes run on `spawn_local`
//! after each committed transition.

use std::rc::Rc;

use leptos::*;
use platform_host::PrefsStore;

use crate::{
    config::{StorageConfig, WorkspaceConfig},
    model::{DesktopState, WindowId},
    persistence::{flush_pending_writes, load_boot_snapshot, PendingWrites},
    reducer::{reduce_desktop, DesktopAction, RuntimeEffect},
    window_resources::{TimerHandle, WindowResourceTable},
};

#[derive(Clone, Copy)]
/// Leptos context for reading desktop state and dispatching [`DesktopAction`] values.
pub struct DesktopRuntimeContext {
    /// Reactive desktop state signal.
    pub state: RwSignal<DesktopState>,
    /// Effects the rendering layer still has to act on, such as input focus.
    pub effects: RwSignal<Vec<RuntimeEffect>>,
    /// Set once boot hydration has been applied; gestures dispatched earlier are deferred until
    /// then.
    pub booted: RwSignal<bool>,
    /// Timers scoped to open windows.
    pub resources: StoredValue<WindowResourceTable>,
    /// Reducer dispatch callback.
    pub dispatch: Callback<DesktopAction>,
}

impl DesktopRuntimeContext {
    /// Dispatches a reducer action through the runtime context callback.
    pub fn dispatch_action(&self, action: DesktopAction) {
        self.dispatch.call(action);
    }

    /// Scopes `timer` to `window_id`; cancels it at once if the window is not open.
    pub fn attach_timer(&self, window_id: WindowId, timer: TimerHandle) -> bool {
        let open = self
            .state
            .with_untracked(|desktop| desktop.windows.get(window_id).is_some());
        if !open {
            timer.cancel();
            return false;
        }
        self.resources
            .update_value(|table| table.attach_timer(window_id, timer));
        true
    }

    /// Drains the pending rendering-layer effects in emission order.
    pub fn take_effects(&self) -> Vec<RuntimeEffect> {
        let queued = self.effects.get_untracked();
        if !queued.is_empty() {
            self.effects.set(Vec::new());
        }
        queued
    }
}

/// Commits a successful transition and returns the records it asks to persist.
fn commit_transition(
    state: RwSignal<DesktopState>,
    effects: RwSignal<Vec<RuntimeEffect>>,
    resources: StoredValue<WindowResourceTable>,
    next: DesktopState,
    new_effects: Vec<RuntimeEffect>,
) -> PendingWrites {
    let windows_changed = state.with_untracked(|current| current.windows != next.windows);
    if windows_changed {
        resources.update_value(|table| {
            table.sync_windows(next.windows.windows());
        });
    }

    let writes = PendingWrites::capture(&next, &new_effects);
    let mut ui_effects = Vec::new();
    for effect in new_effects {
        match effect {
            RuntimeEffect::ReleaseWindowResources(window_id) => {
                resources.update_value(|table| {
                    table.release(window_id);
                });
            }
            RuntimeEffect::FocusWindowInput(_) => ui_effects.push(effect),
            RuntimeEffect::PersistItems | RuntimeEffect::PersistWindows => {}
        }
    }

    if state.with_untracked(|current| *current != next) {
        state.set(next);
    }
    if !ui_effects.is_empty() {
        effects.update(|queue| queue.extend(ui_effects));
    }
    writes
}

fn spawn_persist<S: PrefsStore + 'static>(
    store: Rc<S>,
    storage: StorageConfig,
    writes: PendingWrites,
) {
    spawn_local(async move {
        for err in flush_pending_writes(store.as_ref(), &storage, writes).await {
            logging::warn!("desktop persistence error: {err}");
        }
    });
}

/// Holds gestures back until boot hydration has been applied.
///
/// A gesture committed before hydration would persist an empty desktop over the stored one and
/// then be replaced by the hydrated snapshot.
#[derive(Debug, Default)]
struct BootGate {
    is_open: bool,
    queued: Vec<DesktopAction>,
}

impl BootGate {
    /// Returns the action if it may run now; queues it otherwise.
    fn admit(&mut self, action: DesktopAction) -> Option<DesktopAction> {
        let boot_action = matches!(
            action,
            DesktopAction::HydrateSnapshot { .. } | DesktopAction::SeedCatalog { .. }
        );
        if self.is_open || boot_action {
            return Some(action);
        }
        logging::log!("deferring desktop action until boot hydration lands");
        self.queued.push(action);
        None
    }

    /// Opens the gate and hands back the deferred actions in arrival order.
    fn open(&mut self) -> Vec<DesktopAction> {
        self.is_open = true;
        std::mem::take(&mut self.queued)
    }
}

/// Reduces and commits one action, returning the records to persist.
fn run_action(
    state: RwSignal<DesktopState>,
    effects: RwSignal<Vec<RuntimeEffect>>,
    resources: StoredValue<WindowResourceTable>,
    action: DesktopAction,
) -> Option<PendingWrites> {
    let mut desktop = state.get_untracked();
    match reduce_desktop(&mut desktop, action) {
        Ok(new_effects) => Some(commit_transition(
            state,
            effects,
            resources,
            desktop,
            new_effects,
        )),
        Err(err) => {
            logging::warn!("desktop reducer error ({:?}): {err}", err.class());
            None
        }
    }
}

fn install_boot_hydration<S: PrefsStore + 'static>(
    store: Rc<S>,
    config: Rc<WorkspaceConfig>,
    runtime: DesktopRuntimeContext,
    gate: StoredValue<BootGate>,
) {
    create_effect(move |_| {
        let store = Rc::clone(&store);
        let config = Rc::clone(&config);
        spawn_local(async move {
            let boot = load_boot_snapshot(store.as_ref(), &config).await;
            runtime.dispatch_action(DesktopAction::HydrateSnapshot {
                snapshot: boot.snapshot,
            });

            if boot.first_boot && !config.seed_apps.is_empty() {
                logging::log!("seeding {} catalog apps on first boot", config.seed_apps.len());
                runtime.dispatch_action(DesktopAction::SeedCatalog {
                    apps: config.seed_apps.clone(),
                });
            }
            let deferred = gate.try_update_value(BootGate::open).unwrap_or_default();
            runtime.booted.set(true);
            for action in deferred {
                runtime.dispatch_action(action);
            }
        });
    });
}

/// Creates the runtime, provides it as context, and starts boot hydration.
///
/// Window resources are released when the current reactive owner is cleaned up.
pub fn provide_desktop_runtime<S: PrefsStore + 'static>(
    store: S,
    config: WorkspaceConfig,
) -> DesktopRuntimeContext {
    let store = Rc::new(store);
    let config = Rc::new(config);
    let state = create_rw_signal(DesktopState::default());
    let effects = create_rw_signal(Vec::<RuntimeEffect>::new());
    let booted = create_rw_signal(false);
    let resources = store_value(WindowResourceTable::default());
    let gate = store_value(BootGate::default());

    let dispatch = {
        let store = Rc::clone(&store);
        let storage = config.storage.clone();
        Callback::new(move |action: DesktopAction| {
            let Some(action) = gate.try_update_value(|gate| gate.admit(action)).flatten() else {
                return;
            };
            if let Some(writes) = run_action(state, effects, resources, action) {
                if !writes.is_empty() {
                    spawn_persist(Rc::clone(&store), storage.clone(), writes);
                }
            }
        })
    };

    let runtime = DesktopRuntimeContext {
        state,
        effects,
        booted,
        resources,
        dispatch,
    };
    provide_context(runtime);

    on_cleanup(move || {
        resources.try_update_value(|table| table.release_all());
    });
    install_boot_hydration(store, config, runtime, gate);

    runtime
}

/// Returns the current [`DesktopRuntimeContext`].
///
/// # Panics
///
/// Panics if called outside a scope where [`provide_desktop_runtime`] ran.
pub fn use_desktop_runtime() -> DesktopRuntimeContext {
    use_context::<DesktopRuntimeContext>().expect("DesktopRuntimeContext not provided")
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use futures::executor::block_on;
    use platform_host::MemoryPrefsStore;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AppRegistration, ItemId, ItemKind};

    fn signals() -> (
        RwSignal<DesktopState>,
        RwSignal<Vec<RuntimeEffect>>,
        StoredValue<WindowResourceTable>,
    ) {
        (
            create_rw_signal(DesktopState::default()),
            create_rw_signal(Vec::new()),
            store_value(WindowResourceTable::default()),
        )
    }

    fn step(
        state: RwSignal<DesktopState>,
        effects: RwSignal<Vec<RuntimeEffect>>,
        resources: StoredValue<WindowResourceTable>,
        action: DesktopAction,
    ) -> PendingWrites {
        let mut next = state.get_untracked();
        let new_effects = reduce_desktop(&mut next, action).expect("reduce");
        commit_transition(state, effects, resources, next, new_effects)
    }

    #[test]
    fn commit_updates_state_and_queues_focus_effects() {
        let _ = leptos::create_runtime();
        let (state, effects, resources) = signals();

        let writes = step(
            state,
            effects,
            resources,
            DesktopAction::RegisterApp(AppRegistration::new("calc", "Calc", "c.png", "calc")),
        );
        assert!(writes.items.is_some());
        assert!(writes.windows.is_none());

        let writes = step(
            state,
            effects,
            resources,
            DesktopAction::OpenWindow {
                item_id: "calc".into(),
                kind: ItemKind::App,
            },
        );
        assert!(writes.windows.is_some());
        let window_id = state
            .get_untracked()
            .focused_window_id()
            .expect("focused window");
        assert_eq!(
            effects.get_untracked(),
            vec![RuntimeEffect::FocusWindowInput(window_id)]
        );
    }

    #[test]
    fn closing_through_commit_releases_window_timers() {
        let _ = leptos::create_runtime();
        let (state, effects, resources) = signals();
        step(
            state,
            effects,
            resources,
            DesktopAction::OpenWindow {
                item_id: "calc".into(),
                kind: ItemKind::App,
            },
        );
        let window_id = state
            .get_untracked()
            .focused_window_id()
            .expect("focused window");

        let cancelled = Rc::new(Cell::new(false));
        let flag = Rc::clone(&cancelled);
        resources.update_value(|table| {
            table.attach_timer(window_id, TimerHandle::new(move || flag.set(true)));
        });

        step(
            state,
            effects,
            resources,
            DesktopAction::CloseWindow { window_id },
        );
        assert!(cancelled.get());
        assert!(state.get_untracked().windows.is_empty());
    }

    fn register(id: &str) -> DesktopAction {
        DesktopAction::RegisterApp(AppRegistration::new(id, id, "icon.png", id))
    }

    fn item_ids(state: &DesktopState) -> Vec<ItemId> {
        state.items.items().iter().map(|item| item.id().clone()).collect()
    }

    /// Mirrors the dispatch callback: gate, reduce, then flush synchronously.
    fn dispatch_through(
        gate: &mut BootGate,
        store: &MemoryPrefsStore,
        (state, effects, resources): (
            RwSignal<DesktopState>,
            RwSignal<Vec<RuntimeEffect>>,
            StoredValue<WindowResourceTable>,
        ),
        action: DesktopAction,
    ) {
        let Some(action) = gate.admit(action) else {
            return;
        };
        if let Some(writes) = run_action(state, effects, resources, action) {
            let failures = block_on(flush_pending_writes(
                store,
                &StorageConfig::default(),
                writes,
            ));
            assert!(failures.is_empty());
        }
    }

    #[test]
    fn gestures_before_boot_wait_for_hydration() {
        let _ = leptos::create_runtime();
        let config = WorkspaceConfig::default();
        let store = MemoryPrefsStore::default();
        let mut stored = DesktopState::default();
        reduce_desktop(&mut stored, register("calc")).expect("register");
        let writes = PendingWrites::capture(&stored, &[RuntimeEffect::PersistItems]);
        assert!(block_on(flush_pending_writes(&store, &config.storage, writes)).is_empty());
        let stored_items = store.raw(&config.storage.items_key);

        let runtime = signals();
        let mut gate = BootGate::default();
        dispatch_through(&mut gate, &store, runtime, register("paint"));
        assert!(item_ids(&runtime.0.get_untracked()).is_empty());
        assert_eq!(store.raw(&config.storage.items_key), stored_items);

        let boot = block_on(load_boot_snapshot(&store, &config));
        assert!(!boot.first_boot);
        dispatch_through(
            &mut gate,
            &store,
            runtime,
            DesktopAction::HydrateSnapshot {
                snapshot: boot.snapshot,
            },
        );
        for action in gate.open() {
            dispatch_through(&mut gate, &store, runtime, action);
        }

        let expected = vec![ItemId::new("calc"), ItemId::new("paint")];
        assert_eq!(item_ids(&runtime.0.get_untracked()), expected);
        let reloaded = block_on(load_boot_snapshot(&store, &config));
        let reloaded_ids: Vec<ItemId> =
            reloaded.snapshot.items.iter().map(|item| item.id().clone()).collect();
        assert_eq!(reloaded_ids, expected);
    }

    #[test]
    fn open_gate_admits_gestures_immediately() {
        let mut gate = BootGate::default();
        assert_eq!(
            gate.admit(DesktopAction::SeedCatalog { apps: Vec::new() }),
            Some(DesktopAction::SeedCatalog { apps: Vec::new() })
        );
        assert_eq!(gate.admit(register("calc")), None);
        assert_eq!(gate.open(), vec![register("calc")]);
        assert_eq!(gate.admit(register("notes")), Some(register("notes")));
        assert!(gate.open().is_empty());
    }
}
