use std::fmt;

use serde::{Deserialize, Serialize};

/// Icon assigned to folders created from the desktop.
pub const FOLDER_ICON_ID: &str = "folder";
/// Prefix of generated folder ids (`folder-1`, `folder-2`, ...).
pub const FOLDER_ID_PREFIX: &str = "folder-";

/// Stable identifier for an app or folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ItemId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    App,
    Folder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// A launchable application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppItem {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    /// Key the rendering layer uses to look up the UI to mount. Never interpreted here.
    pub component_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_size: Option<WindowSize>,
    #[serde(default)]
    pub is_provisioning: bool,
}

/// A folder of apps. Members are apps only, so folders never nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItem {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub members: Vec<AppItem>,
}

impl FolderItem {
    pub fn member_position(&self, app_id: &ItemId) -> Option<usize> {
        self.members.iter().position(|app| app.id == *app_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    App(AppItem),
    Folder(FolderItem),
}

impl Item {
    pub fn id(&self) -> &ItemId {
        match self {
            Self::App(app) => &app.id,
            Self::Folder(folder) => &folder.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::App(app) => &app.name,
            Self::Folder(folder) => &folder.name,
        }
    }

    pub fn icon(&self) -> &str {
        match self {
            Self::App(app) => &app.icon,
            Self::Folder(folder) => &folder.icon,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::App(_) => ItemKind::App,
            Self::Folder(_) => ItemKind::Folder,
        }
    }

    /// Folders are never provisioning.
    pub fn is_provisioning(&self) -> bool {
        match self {
            Self::App(app) => app.is_provisioning,
            Self::Folder(_) => false,
        }
    }

    pub fn component_key(&self) -> Option<&str> {
        self.as_app().map(|app| app.component_key.as_str())
    }

    pub fn as_app(&self) -> Option<&AppItem> {
        match self {
            Self::App(app) => Some(app),
            Self::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderItem> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::App(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut FolderItem> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::App(_) => None,
        }
    }

    pub(crate) fn set_name(&mut self, name: String) {
        match self {
            Self::App(app) => app.name = name,
            Self::Folder(folder) => folder.name = name,
        }
    }
}

/// Request payload for registering a new app, also used for configured seed apps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegistration {
    pub id: ItemId,
    pub name: String,
    pub icon: String,
    pub component_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_size: Option<WindowSize>,
}

impl AppRegistration {
    pub fn new(
        id: impl Into<ItemId>,
        name: impl Into<String>,
        icon: impl Into<String>,
        component_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            component_key: component_key.into(),
            preferred_size: None,
        }
    }

    pub fn with_preferred_size(mut self, width: u32, height: u32) -> Self {
        self.preferred_size = Some(WindowSize { width, height });
        self
    }

    pub(crate) fn into_app(self, is_provisioning: bool) -> AppItem {
        AppItem {
            id: self.id,
            name: self.name,
            icon: self.icon,
            component_key: self.component_key,
            preferred_size: self.preferred_size,
            is_provisioning,
        }
    }
}

/// Where an item currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Container {
    TopLevel,
    Folder(ItemId),
}

/// Catalog of apps and folders. The top-level order is display order, most recent last.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemRegistry {
    pub(crate) items: Vec<Item>,
    pub(crate) next_folder_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An open window bound to one item by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    /// Lookup key into the registry. May dangle once the item is removed.
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub z_index: u32,
    #[serde(default)]
    pub minimized: bool,
}

/// Open windows in creation order plus the id allocator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStack {
    pub(crate) windows: Vec<WindowRecord>,
    pub(crate) next_window_id: u64,
}

impl Default for WindowStack {
    fn default() -> Self {
        Self {
            windows: Vec::new(),
            next_window_id: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DesktopState {
    pub items: ItemRegistry,
    pub windows: WindowStack,
}

impl DesktopState {
    /// Frontmost visible window.
    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows.focused_window_id()
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        DesktopSnapshot {
            items: self.items.items().to_vec(),
            windows: self.windows.windows().to_vec(),
        }
    }

    /// Rebuilds state from persisted records, repairing duplicate ids and colliding z-indices.
    pub fn from_snapshot(snapshot: DesktopSnapshot) -> Self {
        let windows = WindowStack::from_records(snapshot.windows);
        let mut items = ItemRegistry::from_items(snapshot.items);
        items.reserve_folder_ids(windows.windows().iter().map(|w| &w.item_id));
        Self { items, windows }
    }
}

/// The two persisted records, as read at boot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesktopSnapshot {
    pub items: Vec<Item>,
    pub windows: Vec<WindowRecord>,
}
