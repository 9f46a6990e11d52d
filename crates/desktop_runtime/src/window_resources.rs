//! Per-window scoped resources such as interval timers.
//!
//! Content mounted in a window may start timers. Their cancel hooks are registered here against the
//! window id and run once the window leaves the open set, so a closed window never receives a late
//! tick.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::model::{WindowId, WindowRecord};

/// Cancel hook for one timer. Runs at most once, on [`TimerHandle::cancel`] or drop.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    /// Wraps a cancel hook, typically `move || interval.clear()`.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
/// Timers owned by open windows.
pub struct WindowResourceTable {
    timers: HashMap<WindowId, Vec<TimerHandle>>,
}

impl WindowResourceTable {
    pub fn attach_timer(&mut self, window_id: WindowId, timer: TimerHandle) {
        self.timers.entry(window_id).or_default().push(timer);
    }

    /// Cancels every timer owned by `window_id`. Returns how many were cancelled.
    pub fn release(&mut self, window_id: WindowId) -> usize {
        let Some(timers) = self.timers.remove(&window_id) else {
            return 0;
        };
        let released = timers.len();
        for timer in timers {
            timer.cancel();
        }
        released
    }

    /// Releases resources of windows no longer present in `windows`.
    pub fn sync_windows(&mut self, windows: &[WindowRecord]) -> usize {
        let active: BTreeSet<WindowId> = windows.iter().map(|win| win.id).collect();
        let stale: Vec<WindowId> = self
            .timers
            .keys()
            .copied()
            .filter(|window_id| !active.contains(window_id))
            .collect();

        stale
            .into_iter()
            .map(|window_id| self.release(window_id))
            .sum()
    }

    pub fn release_all(&mut self) -> usize {
        let window_ids: Vec<WindowId> = self.timers.keys().copied().collect();
        window_ids
            .into_iter()
            .map(|window_id| self.release(window_id))
            .sum()
    }

    pub fn timer_count(&self, window_id: WindowId) -> usize {
        self.timers.get(&window_id).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
