//! Lookup from `component_key` to whatever the rendering layer mounts inside a window.
//!
//! The runtime never interprets a component key. The resolver is supplied by the rendering layer
//! and consulted only when a window's content is hydrated.

use std::collections::HashMap;

use crate::model::{AppItem, DesktopState, FolderItem, Item, WindowRecord};

/// Resolves a component key to a renderable handle.
pub trait ComponentResolver<R> {
    fn resolve_component(&self, component_key: &str) -> Option<R>;
}

impl<R, F> ComponentResolver<R> for F
where
    F: Fn(&str) -> Option<R>,
{
    fn resolve_component(&self, component_key: &str) -> Option<R> {
        self(component_key)
    }
}

#[derive(Debug, Clone)]
/// Map-backed [`ComponentResolver`] for renderers known up front.
pub struct ComponentRegistry<R> {
    components: HashMap<String, R>,
}

impl<R> Default for ComponentRegistry<R> {
    fn default() -> Self {
        Self {
            components: HashMap::new(),
        }
    }
}

impl<R> ComponentRegistry<R> {
    /// Registers `component`, returning the handle it replaced.
    pub fn insert(&mut self, component_key: impl Into<String>, component: R) -> Option<R> {
        self.components.insert(component_key.into(), component)
    }

    pub fn with(mut self, component_key: impl Into<String>, component: R) -> Self {
        self.insert(component_key, component);
        self
    }

    pub fn contains(&self, component_key: &str) -> bool {
        self.components.contains_key(component_key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl<R: Clone> ComponentResolver<R> for ComponentRegistry<R> {
    fn resolve_component(&self, component_key: &str) -> Option<R> {
        self.components.get(component_key).cloned()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// What a window should display.
pub enum WindowContent<'a, R> {
    /// An app whose component resolved.
    App { app: &'a AppItem, component: R },
    /// A folder window lists its members.
    Folder(&'a FolderItem),
    /// The window's item no longer exists.
    Orphaned,
    /// The app exists but no renderer is known for its key.
    Unresolved { app: &'a AppItem },
}

/// Resolves the content of `window` against the current registry.
pub fn resolve_window_content<'a, R>(
    state: &'a DesktopState,
    window: &WindowRecord,
    resolver: &impl ComponentResolver<R>,
) -> WindowContent<'a, R> {
    let folder = state
        .items
        .top_level(&window.item_id)
        .and_then(Item::as_folder);
    if let Some(folder) = folder {
        return WindowContent::Folder(folder);
    }

    match state.items.find_app(&window.item_id) {
        Some(app) => match resolver.resolve_component(&app.component_key) {
            Some(component) => WindowContent::App { app, component },
            None => WindowContent::Unresolved { app },
        },
        None => WindowContent::Orphaned,
    }
}

/// Component handle for an app window. Folder and orphaned windows resolve to `None`.
pub fn resolve_window_component<R>(
    state: &DesktopState,
    window: &WindowRecord,
    resolver: &impl ComponentResolver<R>,
) -> Option<R> {
    match resolve_window_content(state, window, resolver) {
        WindowContent::App { component, .. } => Some(component),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AppRegistration, ItemKind};

    fn state() -> DesktopState {
        let mut state = DesktopState::default();
        for (id, key) in [("calc", "calc-view"), ("legacy", "gone-view")] {
            state
                .items
                .register_ready_app(AppRegistration::new(id, id, "icon.png", key))
                .expect("register");
        }
        state.items.create_folder("Games");
        state
    }

    fn window_for(state: &mut DesktopState, id: &str, kind: ItemKind) -> WindowRecord {
        let window_id = state.windows.open(&id.into(), kind);
        state.windows.get(window_id).expect("window").clone()
    }

    #[test]
    fn registry_resolves_known_keys_only() {
        let registry = ComponentRegistry::default().with("calc-view", 7_u32);
        assert_eq!(registry.resolve_component("calc-view"), Some(7));
        assert_eq!(registry.resolve_component("paint-view"), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn closures_act_as_resolvers() {
        let resolver = |key: &str| (key == "calc-view").then(|| "Calculator");
        let mut state = state();
        let window = window_for(&mut state, "calc", ItemKind::App);
        assert_eq!(
            resolve_window_component(&state, &window, &resolver),
            Some("Calculator")
        );
    }

    #[test]
    fn window_content_covers_apps_folders_and_orphans() {
        let registry = ComponentRegistry::default().with("calc-view", 'c');
        let mut state = state();
        let calc = window_for(&mut state, "calc", ItemKind::App);
        let legacy = window_for(&mut state, "legacy", ItemKind::App);
        let folder = window_for(&mut state, "folder-1", ItemKind::Folder);

        assert!(matches!(
            resolve_window_content(&state, &calc, &registry),
            WindowContent::App { component: 'c', .. }
        ));
        assert!(matches!(
            resolve_window_content(&state, &legacy, &registry),
            WindowContent::Unresolved { app } if app.component_key == "gone-view"
        ));
        assert!(matches!(
            resolve_window_content(&state, &folder, &registry),
            WindowContent::Folder(f) if f.name == "Games"
        ));

        state.items.unregister_app(&"calc".into()).expect("unregister");
        assert_eq!(
            resolve_window_content(&state, &calc, &registry),
            WindowContent::Orphaned
        );
        assert_eq!(resolve_window_component(&state, &calc, &registry), None);
    }

    #[test]
    fn apps_inside_folders_still_resolve() {
        let registry = ComponentRegistry::default().with("calc-view", 1_u8);
        let mut state = state();
        let calc = window_for(&mut state, "calc", ItemKind::App);
        state
            .items
            .add_app_to_folder(&"folder-1".into(), &"calc".into())
            .expect("add to folder");
        assert_eq!(resolve_window_component(&state, &calc, &registry), Some(1));
    }
}
