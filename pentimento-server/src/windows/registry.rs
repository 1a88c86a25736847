//! Ordered collection of child windows

use std::collections::HashSet;

use pentimento_utils::Result;
use tracing::{debug, warn};

use super::{Window, WindowId};
use crate::state::View;

/// Ordered, set-like collection of windows keyed by parent surface
///
/// Holds at most one window per parent id.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    windows: Vec<Box<dyn Window>>,
    redraws: u64,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Parent ids of all tracked windows
    pub fn parent_ids(&self) -> HashSet<WindowId> {
        self.windows.iter().map(|w| w.parent_id()).collect()
    }

    /// Number of broadcast draws so far
    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Add windows, destroying any whose parent is already tracked
    ///
    /// Returns the number of windows actually added.
    pub fn extend(&mut self, windows: impl IntoIterator<Item = Box<dyn Window>>) -> usize {
        let mut known = self.parent_ids();
        let mut added = 0;

        for mut window in windows {
            if known.insert(window.parent_id()) {
                debug!(window_id = window.id(), parent_id = window.parent_id(), "Window added");
                self.windows.push(window);
                added += 1;
            } else {
                warn!(parent_id = window.parent_id(), "Duplicate window for parent, destroying");
                window.destroy();
            }
        }

        added
    }

    /// Detach the windows of the given parents
    ///
    /// Absent ids are ignored. The detached windows are returned so the caller
    /// can destroy them.
    pub fn remove_parents(&mut self, parent_ids: &HashSet<WindowId>) -> Vec<Box<dyn Window>> {
        if parent_ids.is_empty() {
            return Vec::new();
        }

        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.windows)
            .into_iter()
            .partition(|w| parent_ids.contains(&w.parent_id()));
        self.windows = kept;
        removed
    }

    /// Draw `view` on every window
    ///
    /// Every window is attempted; the first failure is returned.
    pub fn draw(&mut self, view: &View) -> Result<()> {
        self.redraws += 1;
        let mut first_error = None;

        for window in &mut self.windows {
            if let Err(e) = window.draw(view) {
                warn!(window_id = window.id(), error = %e, "Draw failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Offer the head event to each window until one claims it
    ///
    /// Each event has one target window, and claiming consumes it.
    pub fn process_event(&mut self, view: &View) -> bool {
        self.windows.iter_mut().any(|w| w.process_event(view))
    }

    pub fn reset_terminal_info(&mut self) {
        for window in &mut self.windows {
            window.reset_terminal_info();
        }
    }

    /// Destroy and forget every window
    pub fn destroy_all(&mut self) -> usize {
        let count = self.windows.len();
        for mut window in self.windows.drain(..) {
            window.destroy();
        }
        count
    }
}
