//! Item registry transitions: folders, membership, recency ordering, and app provisioning.
//!
//! Every item id lives in exactly one container, either the top level or a single folder. Lookups
//! that drive mutations only consult the top level; folder members are reached through their
//! folder.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{
    AppItem, AppRegistration, Container, FolderItem, Item, ItemId, ItemKind, ItemRegistry,
    FOLDER_ICON_ID, FOLDER_ID_PREFIX,
};

/// Coarse classification of registry failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The referenced id is absent from the expected container.
    NotFound,
    /// The target is the wrong kind or the source already lives elsewhere.
    InvalidContainment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("item `{0}` is not at the top level")]
    ItemNotFound(ItemId),
    #[error("item `{0}` is not a folder")]
    NotAFolder(ItemId),
    #[error("item `{0}` is not an app")]
    NotAnApp(ItemId),
    #[error("folder `{folder_id}` does not contain `{app_id}`")]
    AppNotInFolder { folder_id: ItemId, app_id: ItemId },
    #[error("item `{0}` is already registered")]
    AlreadyRegistered(ItemId),
}

impl RegistryError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::ItemNotFound(_) | Self::AppNotInFolder { .. } => ErrorClass::NotFound,
            Self::NotAFolder(_) | Self::NotAnApp(_) | Self::AlreadyRegistered(_) => {
                ErrorClass::InvalidContainment
            }
        }
    }
}

impl ItemRegistry {
    /// Builds a registry from persisted items, keeping the first occurrence of any repeated id.
    pub fn from_items(items: Vec<Item>) -> Self {
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(items.len());
        for mut item in items {
            if !seen.insert(item.id().clone()) {
                continue;
            }
            if let Item::Folder(folder) = &mut item {
                folder.members.retain(|app| seen.insert(app.id.clone()));
            }
            kept.push(item);
        }

        let mut registry = Self {
            items: kept,
            next_folder_seq: 1,
        };
        let ids = registry.all_ids();
        registry.reserve_folder_ids(ids.iter());
        registry
    }

    /// Top-level items in display order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every id in the registry: top level first, then each folder's members in place.
    pub fn all_ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        for item in &self.items {
            ids.push(item.id().clone());
            if let Item::Folder(folder) = item {
                ids.extend(folder.members.iter().map(|app| app.id.clone()));
            }
        }
        ids
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.container_of(id).is_some()
    }

    pub fn top_level(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn top_level_position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Read-only lookup that also searches folder members.
    pub fn container_of(&self, id: &ItemId) -> Option<Container> {
        for item in &self.items {
            if item.id() == id {
                return Some(Container::TopLevel);
            }
            if let Item::Folder(folder) = item {
                if folder.member_position(id).is_some() {
                    return Some(Container::Folder(folder.id.clone()));
                }
            }
        }
        None
    }

    /// Read-only lookup of an app wherever it lives.
    pub fn find_app(&self, id: &ItemId) -> Option<&AppItem> {
        self.items.iter().find_map(|item| match item {
            Item::App(app) if app.id == *id => Some(app),
            Item::App(_) => None,
            Item::Folder(folder) => folder.members.iter().find(|app| app.id == *id),
        })
    }

    pub fn kind_of(&self, id: &ItemId) -> Option<ItemKind> {
        match self.top_level(id) {
            Some(item) => Some(item.kind()),
            None => self.find_app(id).map(|_| ItemKind::App),
        }
    }

    /// Name and icon for display, wherever the item lives.
    pub fn label_of(&self, id: &ItemId) -> Option<(&str, &str)> {
        if let Some(item) = self.top_level(id) {
            return Some((item.name(), item.icon()));
        }
        self.find_app(id)
            .map(|app| (app.name.as_str(), app.icon.as_str()))
    }

    /// Appends a new empty folder with a freshly allocated id.
    pub fn create_folder(&mut self, name: impl Into<String>) -> Item {
        let id = self.allocate_folder_id();
        let folder = Item::Folder(FolderItem {
            id,
            name: name.into(),
            icon: FOLDER_ICON_ID.to_string(),
            members: Vec::new(),
        });
        self.items.push(folder.clone());
        folder
    }

    /// Removes a top-level folder and appends its members to the top level, order preserved.
    ///
    /// Returns the ids of the released members.
    pub fn delete_folder(&mut self, folder_id: &ItemId) -> Result<Vec<ItemId>, RegistryError> {
        let index = self.folder_position(folder_id)?;
        let members = self.items[index]
            .as_folder_mut()
            .map(|folder| std::mem::take(&mut folder.members))
            .unwrap_or_default();
        self.items.remove(index);

        let released = members.iter().map(|app| app.id.clone()).collect();
        self.items.extend(members.into_iter().map(Item::App));
        Ok(released)
    }

    /// Moves a top-level app to the end of a top-level folder.
    pub fn add_app_to_folder(
        &mut self,
        folder_id: &ItemId,
        app_id: &ItemId,
    ) -> Result<(), RegistryError> {
        self.folder_position(folder_id)?;
        let app_index = self
            .top_level_position(app_id)
            .ok_or_else(|| RegistryError::ItemNotFound(app_id.clone()))?;
        let app = match &self.items[app_index] {
            Item::App(app) => app.clone(),
            Item::Folder(_) => return Err(RegistryError::NotAnApp(app_id.clone())),
        };
        self.items.remove(app_index);
        // Removing the app may have shifted the folder.
        let folder_index = self.folder_position(folder_id)?;
        if let Item::Folder(folder) = &mut self.items[folder_index] {
            folder.members.push(app);
        }
        Ok(())
    }

    /// Takes an app out of a folder and appends it to the top level. The folder stays in place.
    pub fn remove_app_from_folder(
        &mut self,
        folder_id: &ItemId,
        app_id: &ItemId,
    ) -> Result<(), RegistryError> {
        let folder_index = self.folder_position(folder_id)?;
        let app = self.items[folder_index]
            .as_folder_mut()
            .and_then(|folder| {
                let member_index = folder.member_position(app_id)?;
                Some(folder.members.remove(member_index))
            })
            .ok_or_else(|| RegistryError::AppNotInFolder {
                folder_id: folder_id.clone(),
                app_id: app_id.clone(),
            })?;
        self.items.push(Item::App(app));
        Ok(())
    }

    /// Moves a top-level item to the end of the ordering.
    pub fn move_to_recent(&mut self, id: &ItemId) -> Result<(), RegistryError> {
        let index = self
            .top_level_position(id)
            .ok_or_else(|| RegistryError::ItemNotFound(id.clone()))?;
        let item = self.items.remove(index);
        self.items.push(item);
        Ok(())
    }

    /// Appends a new provisioning app. Ids already present anywhere are rejected.
    pub fn register_app(&mut self, registration: AppRegistration) -> Result<Item, RegistryError> {
        self.insert_app(registration, true)
    }

    /// Appends an app that is ready immediately, as seed catalog entries are.
    pub fn register_ready_app(
        &mut self,
        registration: AppRegistration,
    ) -> Result<Item, RegistryError> {
        self.insert_app(registration, false)
    }

    /// Removes a top-level app. Folders are not searched.
    pub fn unregister_app(&mut self, id: &ItemId) -> Result<Item, RegistryError> {
        let index = self
            .top_level_position(id)
            .ok_or_else(|| RegistryError::ItemNotFound(id.clone()))?;
        if !matches!(self.items[index], Item::App(_)) {
            return Err(RegistryError::NotAnApp(id.clone()));
        }
        Ok(self.items.remove(index))
    }

    /// Clears the provisioning flag and surfaces the item as most recent.
    pub fn finish_provisioning(&mut self, id: &ItemId) -> Result<(), RegistryError> {
        let index = self
            .top_level_position(id)
            .ok_or_else(|| RegistryError::ItemNotFound(id.clone()))?;
        let mut item = self.items.remove(index);
        if let Item::App(app) = &mut item {
            app.is_provisioning = false;
        }
        self.items.push(item);
        Ok(())
    }

    /// Renames a top-level item or a folder member in place.
    pub fn rename_item(
        &mut self,
        id: &ItemId,
        name: impl Into<String>,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        for item in &mut self.items {
            if item.id() == id {
                item.set_name(name);
                return Ok(());
            }
            if let Item::Folder(folder) = item {
                if let Some(app) = folder.members.iter_mut().find(|app| app.id == *id) {
                    app.name = name;
                    return Ok(());
                }
            }
        }
        Err(RegistryError::ItemNotFound(id.clone()))
    }

    /// Bumps the folder allocator past any `folder-N` id in `ids`.
    ///
    /// Windows can outlive their folder, so boot reserves their item ids too; a new folder must
    /// never adopt an orphaned window.
    pub fn reserve_folder_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) {
        for id in ids {
            if let Some(seq) = id
                .as_str()
                .strip_prefix(FOLDER_ID_PREFIX)
                .and_then(|raw| raw.parse::<u64>().ok())
            {
                self.next_folder_seq = self.next_folder_seq.max(seq.saturating_add(1));
            }
        }
    }

    fn insert_app(
        &mut self,
        registration: AppRegistration,
        is_provisioning: bool,
    ) -> Result<Item, RegistryError> {
        if self.contains(&registration.id) {
            return Err(RegistryError::AlreadyRegistered(registration.id));
        }
        let item = Item::App(registration.into_app(is_provisioning));
        self.items.push(item.clone());
        Ok(item)
    }

    fn folder_position(&self, folder_id: &ItemId) -> Result<usize, RegistryError> {
        let index = self
            .top_level_position(folder_id)
            .ok_or_else(|| RegistryError::ItemNotFound(folder_id.clone()))?;
        match self.items[index] {
            Item::Folder(_) => Ok(index),
            Item::App(_) => Err(RegistryError::NotAFolder(folder_id.clone())),
        }
    }

    fn allocate_folder_id(&mut self) -> ItemId {
        let mut seq = self.next_folder_seq.max(1);
        loop {
            let candidate = ItemId::new(format!("{FOLDER_ID_PREFIX}{seq}"));
            seq = seq.saturating_add(1);
            if !self.contains(&candidate) {
                self.next_folder_seq = seq;
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn app(id: &str) -> AppRegistration {
        AppRegistration::new(id, id.to_uppercase(), format!("{id}.png"), format!("{id}-key"))
    }

    fn registry_with(ids: &[&str]) -> ItemRegistry {
        let mut registry = ItemRegistry::default();
        for id in ids {
            registry.register_ready_app(app(id)).expect("register");
        }
        registry
    }

    fn top_ids(registry: &ItemRegistry) -> Vec<&str> {
        registry.items().iter().map(|item| item.id().as_str()).collect()
    }

    fn member_ids<'a>(registry: &'a ItemRegistry, folder_id: &ItemId) -> Vec<&'a str> {
        registry
            .top_level(folder_id)
            .and_then(Item::as_folder)
            .expect("folder")
            .members
            .iter()
            .map(|app| app.id.as_str())
            .collect()
    }

    #[test]
    fn walkthrough_register_provision_fold_and_release() {
        let mut registry = ItemRegistry::default();

        let item = registry
            .register_app(AppRegistration::new("a1", "Calc", "icon.png", "calc-key"))
            .expect("register");
        assert!(item.is_provisioning());
        assert_eq!(top_ids(&registry), vec!["a1"]);

        registry.finish_provisioning(&"a1".into()).expect("finish");
        assert!(!registry.items()[0].is_provisioning());
        assert_eq!(top_ids(&registry), vec!["a1"]);

        let folder = registry.create_folder("Utils");
        assert_eq!(top_ids(&registry), vec!["a1", folder.id().as_str()]);

        registry
            .add_app_to_folder(folder.id(), &"a1".into())
            .expect("add");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str()]);
        assert_eq!(member_ids(&registry, folder.id()), vec!["a1"]);

        registry.delete_folder(folder.id()).expect("delete");
        assert_eq!(top_ids(&registry), vec!["a1"]);
    }

    #[test]
    fn create_folder_allocates_fresh_ids_even_for_duplicate_names() {
        let mut registry = ItemRegistry::default();
        let first = registry.create_folder("Games");
        let second = registry.create_folder("Games");
        let unnamed = registry.create_folder("");

        assert_ne!(first.id(), second.id());
        assert_ne!(second.id(), unnamed.id());
        assert_eq!(first.icon(), FOLDER_ICON_ID);
        assert_eq!(registry.items().len(), 3);
    }

    #[test]
    fn create_folder_skips_ids_taken_by_registered_apps() {
        let mut registry = registry_with(&["folder-1"]);
        let folder = registry.create_folder("Docs");
        assert_eq!(folder.id().as_str(), "folder-2");
    }

    #[test]
    fn delete_folder_releases_members_in_order_after_existing_items() {
        let mut registry = registry_with(&["a", "b", "c", "d"]);
        let folder = registry.create_folder("Box");
        for id in ["a", "b", "c"] {
            registry
                .add_app_to_folder(folder.id(), &id.into())
                .expect("add");
        }
        assert_eq!(top_ids(&registry), vec!["d", folder.id().as_str()]);

        let released = registry.delete_folder(folder.id()).expect("delete");
        let expected: Vec<ItemId> = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(released, expected);
        assert_eq!(top_ids(&registry), vec!["d", "a", "b", "c"]);
        assert!(!registry.contains(folder.id()));
    }

    #[test]
    fn delete_folder_rejects_missing_ids_and_apps() {
        let mut registry = registry_with(&["a"]);
        assert_eq!(
            registry.delete_folder(&"nope".into()),
            Err(RegistryError::ItemNotFound("nope".into()))
        );
        assert_eq!(
            registry.delete_folder(&"a".into()),
            Err(RegistryError::NotAFolder("a".into()))
        );
        assert_eq!(top_ids(&registry), vec!["a"]);
    }

    #[test]
    fn add_app_to_folder_does_not_reach_into_other_folders() {
        let mut registry = registry_with(&["a"]);
        let first = registry.create_folder("One");
        let second = registry.create_folder("Two");
        registry
            .add_app_to_folder(first.id(), &"a".into())
            .expect("add");

        let err = registry
            .add_app_to_folder(second.id(), &"a".into())
            .expect_err("nested app is not top level");
        assert_eq!(err, RegistryError::ItemNotFound("a".into()));
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert_eq!(member_ids(&registry, first.id()), vec!["a"]);
        assert!(member_ids(&registry, second.id()).is_empty());
    }

    #[test]
    fn add_folder_to_folder_is_invalid_containment() {
        let mut registry = ItemRegistry::default();
        let outer = registry.create_folder("Outer");
        let inner = registry.create_folder("Inner");

        let err = registry
            .add_app_to_folder(outer.id(), inner.id())
            .expect_err("folders do not nest");
        assert_eq!(err.class(), ErrorClass::InvalidContainment);
        assert_eq!(registry.items().len(), 2);
    }

    #[test]
    fn remove_then_add_round_trips_membership_at_the_end() {
        let mut registry = registry_with(&["a", "b", "c"]);
        let folder = registry.create_folder("F");
        for id in ["a", "b", "c"] {
            registry
                .add_app_to_folder(folder.id(), &id.into())
                .expect("add");
        }

        registry
            .remove_app_from_folder(folder.id(), &"a".into())
            .expect("remove");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str(), "a"]);
        assert_eq!(member_ids(&registry, folder.id()), vec!["b", "c"]);

        registry
            .add_app_to_folder(folder.id(), &"a".into())
            .expect("add back");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str()]);
        assert_eq!(member_ids(&registry, folder.id()), vec!["b", "c", "a"]);
    }

    #[test]
    fn remove_app_from_folder_keeps_folder_in_place() {
        let mut registry = registry_with(&["a", "z"]);
        let folder = registry.create_folder("F");
        registry
            .add_app_to_folder(folder.id(), &"a".into())
            .expect("add");
        registry.move_to_recent(&"z".into()).expect("recent");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str(), "z"]);

        registry
            .remove_app_from_folder(folder.id(), &"a".into())
            .expect("remove");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str(), "z", "a"]);
        assert_eq!(
            registry
                .items()
                .iter()
                .filter(|item| item.id() == folder.id())
                .count(),
            1
        );
    }

    #[test]
    fn remove_app_not_in_folder_is_not_found() {
        let mut registry = registry_with(&["a"]);
        let folder = registry.create_folder("F");
        let err = registry
            .remove_app_from_folder(folder.id(), &"a".into())
            .expect_err("a is top level");
        assert_eq!(
            err,
            RegistryError::AppNotInFolder {
                folder_id: folder.id().clone(),
                app_id: "a".into(),
            }
        );
        assert_eq!(top_ids(&registry), vec!["a", folder.id().as_str()]);
    }

    #[test]
    fn move_to_recent_appends_and_ignores_unknown_ids() {
        let mut registry = registry_with(&["a", "b", "c"]);
        registry.move_to_recent(&"a".into()).expect("recent");
        assert_eq!(top_ids(&registry), vec!["b", "c", "a"]);
        assert!(registry.move_to_recent(&"zzz".into()).is_err());
        assert_eq!(top_ids(&registry), vec!["b", "c", "a"]);
    }

    #[test]
    fn register_app_rejects_ids_hidden_inside_folders() {
        let mut registry = registry_with(&["a"]);
        let folder = registry.create_folder("F");
        registry
            .add_app_to_folder(folder.id(), &"a".into())
            .expect("add");

        let err = registry.register_app(app("a")).expect_err("duplicate");
        assert_eq!(err, RegistryError::AlreadyRegistered("a".into()));
        assert_eq!(registry.all_ids().len(), 2);
    }

    #[test]
    fn unregister_app_only_touches_top_level_apps() {
        let mut registry = registry_with(&["a", "b"]);
        let folder = registry.create_folder("F");
        registry
            .add_app_to_folder(folder.id(), &"b".into())
            .expect("add");

        assert!(registry.unregister_app(&"b".into()).is_err());
        assert_eq!(
            registry.unregister_app(folder.id()),
            Err(RegistryError::NotAnApp(folder.id().clone()))
        );
        let removed = registry.unregister_app(&"a".into()).expect("unregister");
        assert_eq!(removed.id().as_str(), "a");
        assert_eq!(top_ids(&registry), vec![folder.id().as_str()]);
    }

    #[test]
    fn finish_provisioning_surfaces_item_as_most_recent() {
        let mut registry = ItemRegistry::default();
        registry.register_app(app("slow")).expect("register");
        registry.register_ready_app(app("fast")).expect("register");

        registry.finish_provisioning(&"slow".into()).expect("finish");
        assert_eq!(top_ids(&registry), vec!["fast", "slow"]);
        assert!(registry.items().iter().all(|item| !item.is_provisioning()));
        assert!(registry.finish_provisioning(&"ghost".into()).is_err());
    }

    #[test]
    fn rename_reaches_folder_members() {
        let mut registry = registry_with(&["a"]);
        let folder = registry.create_folder("F");
        registry
            .add_app_to_folder(folder.id(), &"a".into())
            .expect("add");

        registry.rename_item(&"a".into(), "Alpha").expect("rename");
        registry.rename_item(folder.id(), "Tools").expect("rename");
        assert_eq!(registry.label_of(&"a".into()), Some(("Alpha", "a.png")));
        assert_eq!(registry.items()[0].name(), "Tools");
    }

    #[test]
    fn lookups_report_containers_and_kinds() {
        let mut registry = registry_with(&["a", "b"]);
        let folder = registry.create_folder("F");
        registry
            .add_app_to_folder(folder.id(), &"a".into())
            .expect("add");

        assert_eq!(
            registry.container_of(&"a".into()),
            Some(Container::Folder(folder.id().clone()))
        );
        assert_eq!(registry.container_of(&"b".into()), Some(Container::TopLevel));
        assert_eq!(registry.container_of(&"c".into()), None);
        assert_eq!(registry.kind_of(folder.id()), Some(ItemKind::Folder));
        assert_eq!(registry.kind_of(&"a".into()), Some(ItemKind::App));
        assert_eq!(
            registry.find_app(&"a".into()).map(|app| app.component_key.as_str()),
            Some("a-key")
        );
    }

    #[test]
    fn from_items_drops_repeated_ids_and_reserves_folder_sequence() {
        let a = app("a").into_app(false);
        let items = vec![
            Item::App(a.clone()),
            Item::Folder(FolderItem {
                id: "folder-7".into(),
                name: "F".to_string(),
                icon: FOLDER_ICON_ID.to_string(),
                members: vec![a.clone(), app("b").into_app(false)],
            }),
            Item::App(a),
        ];

        let mut registry = ItemRegistry::from_items(items);
        let expected: Vec<ItemId> = vec!["a".into(), "folder-7".into(), "b".into()];
        assert_eq!(registry.all_ids(), expected);
        assert_eq!(registry.create_folder("next").id().as_str(), "folder-8");
    }
}
