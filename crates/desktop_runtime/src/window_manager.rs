//! Window-stack transitions used by the desktop reducer.
//!
//! Stacking is tracked with explicit z-indices rather than vector order: `windows` stays in
//! creation order (the taskbar order) and every promotion assigns `max + 1`.

use std::collections::HashSet;

use crate::model::{ItemId, ItemKind, ItemRegistry, WindowId, WindowRecord, WindowStack};

/// What a taskbar click did to its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskbarToggle {
    Restored,
    Minimized,
    Focused,
}

impl WindowStack {
    /// Rebuilds a stack from persisted records.
    ///
    /// Keeps the first window per item, compacts z-indices to `1..=n` preserving relative order,
    /// and restarts the id allocator above the largest persisted id.
    pub fn from_records(records: Vec<WindowRecord>) -> Self {
        let mut seen_ids = HashSet::new();
        let mut seen_items = HashSet::new();
        let windows = records
            .into_iter()
            .filter(|w| seen_ids.insert(w.id) && seen_items.insert(w.item_id.clone()))
            .collect();

        let mut stack = Self {
            windows,
            next_window_id: 1,
        };
        stack.next_window_id = stack
            .windows
            .iter()
            .map(|w| w.id.0)
            .max()
            .unwrap_or(0)
            .saturating_add(1);
        stack.normalize();
        stack
    }

    /// Open windows in creation order.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn get(&self, window_id: WindowId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.id == window_id)
    }

    pub fn window_for_item(&self, item_id: &ItemId) -> Option<&WindowRecord> {
        self.windows.iter().find(|w| w.item_id == *item_id)
    }

    /// Largest z-index currently assigned, `0` when nothing is open.
    pub fn max_z_index(&self) -> u32 {
        self.windows.iter().map(|w| w.z_index).max().unwrap_or(0)
    }

    /// Frontmost window that is not minimized.
    pub fn focused_window_id(&self) -> Option<WindowId> {
        self.windows
            .iter()
            .filter(|w| !w.minimized)
            .max_by_key(|w| w.z_index)
            .map(|w| w.id)
    }

    /// Non-minimized windows ordered back to front.
    pub fn visible_windows(&self) -> Vec<&WindowRecord> {
        let mut visible: Vec<&WindowRecord> =
            self.windows.iter().filter(|w| !w.minimized).collect();
        visible.sort_by_key(|w| (w.z_index, w.id));
        visible
    }

    /// Opens a window for `item_id`, or brings the existing one forward.
    ///
    /// An existing minimized window is restored rather than duplicated.
    pub fn open(&mut self, item_id: &ItemId, kind: ItemKind) -> WindowId {
        if let Some(existing) = self.window_for_item(item_id).map(|w| w.id) {
            self.restore(existing);
            return existing;
        }

        let id = WindowId(self.next_window_id);
        self.next_window_id = self.next_window_id.saturating_add(1);
        let z_index = self.next_z_index();
        self.windows.push(WindowRecord {
            id,
            item_id: item_id.clone(),
            kind,
            z_index,
            minimized: false,
        });
        id
    }

    /// Promotes a window to a strict new maximum z-index.
    ///
    /// Returns `false` when the window is not open.
    pub fn focus(&mut self, window_id: WindowId) -> bool {
        if self.get(window_id).is_none() {
            return false;
        }
        let z_index = self.next_z_index();
        if let Some(window) = self.windows.iter_mut().find(|w| w.id == window_id) {
            window.z_index = z_index;
        }
        true
    }

    pub fn minimize(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.windows.iter_mut().find(|w| w.id == window_id) else {
            return false;
        };
        window.minimized = true;
        true
    }

    /// Unminimizes and promotes a window.
    pub fn restore(&mut self, window_id: WindowId) -> bool {
        let Some(window) = self.windows.iter_mut().find(|w| w.id == window_id) else {
            return false;
        };
        window.minimized = false;
        self.focus(window_id)
    }

    /// Removes a window. The referenced item is untouched.
    pub fn close(&mut self, window_id: WindowId) -> Option<WindowRecord> {
        let index = self.windows.iter().position(|w| w.id == window_id)?;
        Some(self.windows.remove(index))
    }

    /// Taskbar button behavior: restore when minimized, minimize when frontmost, focus otherwise.
    pub fn toggle_taskbar(&mut self, window_id: WindowId) -> Option<TaskbarToggle> {
        let minimized = self.get(window_id)?.minimized;
        if minimized {
            self.restore(window_id);
            Some(TaskbarToggle::Restored)
        } else if self.focused_window_id() == Some(window_id) {
            self.minimize(window_id);
            Some(TaskbarToggle::Minimized)
        } else {
            self.focus(window_id);
            Some(TaskbarToggle::Focused)
        }
    }

    /// Closes every window whose item no longer exists and returns the closed records.
    pub fn close_orphans(&mut self, registry: &ItemRegistry) -> Vec<WindowRecord> {
        let (orphans, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.windows)
            .into_iter()
            .partition(|w| !registry.contains(&w.item_id));
        self.windows = kept;
        orphans
    }

    /// Re-ranks z-indices to `1..=n`, keeping relative order. Ties break by window id.
    pub fn normalize(&mut self) {
        let mut order: Vec<usize> = (0..self.windows.len()).collect();
        order.sort_by_key(|&idx| (self.windows[idx].z_index, self.windows[idx].id));
        for (rank, idx) in order.into_iter().enumerate() {
            self.windows[idx].z_index = (rank + 1) as u32;
        }
    }

    /// Next strict maximum. Compacts the stack first when the maximum has run out of room.
    fn next_z_index(&mut self) -> u32 {
        if self.max_z_index() == u32::MAX {
            self.normalize();
        }
        self.max_z_index() + 1
    }
}
