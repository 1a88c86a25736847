//! Session reconciliation
//!
//! Compares the parent surfaces of the clients currently showing the pane with
//! the windows the registry tracks, then creates and destroys windows so the
//! two match.

use std::collections::HashSet;

use pentimento_utils::Result;
use tracing::{debug, info};

use crate::state::SharedState;
use crate::windows::{ParentInfo, WindowId};

/// Set difference between tracked and live parents
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WindowDiff {
    /// Live parents without a window, in live order
    pub added: Vec<ParentInfo>,
    /// Tracked parents that are gone
    pub removed: HashSet<WindowId>,
}

impl WindowDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// What a reconciliation changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub destroyed: usize,
}

impl ReconcileOutcome {
    pub fn changed(&self) -> bool {
        self.created > 0 || self.destroyed > 0
    }
}

/// `added = live - current`, `removed = current - live`
pub fn diff(current: &HashSet<WindowId>, live: &[ParentInfo]) -> WindowDiff {
    let live_ids: HashSet<WindowId> = live.iter().map(|p| p.id).collect();

    let mut seen = HashSet::new();
    let added = live
        .iter()
        .filter(|p| !current.contains(&p.id) && seen.insert(p.id))
        .cloned()
        .collect();
    let removed = current.difference(&live_ids).copied().collect();

    WindowDiff { added, removed }
}

/// Bring the registry in line with the visible clients
///
/// Updates the view offset and redraws only when a window was created or
/// destroyed.
pub fn reconcile(shared: &SharedState) -> Result<ReconcileOutcome> {
    let pids = shared.multiplexer.client_pids()?;
    let parents = shared.display.parent_infos(&pids)?;
    let offset = shared.multiplexer.pane_offset()?;

    let mut state = shared.state.lock();
    state.view.offset = offset;

    let diff = diff(&state.registry.parent_ids(), &parents);
    if diff.is_empty() {
        debug!(clients = pids.len(), "Windows already match clients");
        return Ok(ReconcileOutcome::default());
    }

    let created = state
        .registry
        .extend(shared.display.create_windows(&diff.added)?);

    let mut removed = state.registry.remove_parents(&diff.removed);
    for window in &mut removed {
        window.destroy();
    }

    let outcome = ReconcileOutcome {
        created,
        destroyed: removed.len(),
    };
    info!(created = outcome.created, destroyed = outcome.destroyed, "Windows reconciled");

    if outcome.changed() {
        state.redraw()?;
    }
    Ok(outcome)
}
