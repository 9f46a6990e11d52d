//! Taskbar view of the window stack.

use crate::model::{DesktopState, ItemId, ItemKind, WindowId};

/// Label shown for a window whose item was removed.
pub const ORPHANED_WINDOW_TITLE: &str = "Unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
/// One taskbar button.
pub struct TaskbarEntry {
    pub window_id: WindowId,
    pub item_id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    /// Empty for orphaned windows.
    pub icon: String,
    pub minimized: bool,
    pub focused: bool,
    pub orphaned: bool,
}

/// Every open window, minimized ones included, in creation order.
pub fn taskbar_entries(state: &DesktopState) -> Vec<TaskbarEntry> {
    let focused = state.focused_window_id();
    state
        .windows
        .windows()
        .iter()
        .map(|win| {
            let label = state.items.label_of(&win.item_id);
            let (title, icon) = label.unwrap_or((ORPHANED_WINDOW_TITLE, ""));
            TaskbarEntry {
                window_id: win.id,
                item_id: win.item_id.clone(),
                kind: win.kind,
                title: title.to_string(),
                icon: icon.to_string(),
                minimized: win.minimized,
                focused: focused == Some(win.id),
                orphaned: label.is_none(),
            }
        })
        .collect()
}
