use crate::types::{Result, Side, ViewState};
use crate::viewer::{ComparisonViewer, page_offset};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Mirrors scroll and zoom from one viewer onto the other.
///
/// Applying a view state fires the other viewer's change event, which lands
/// back here; the `syncing` flag drops that echo.
pub struct ViewSync {
    original: Arc<dyn ComparisonViewer>,
    changed: Arc<dyn ComparisonViewer>,
    page_spacing: f32,
    locked: AtomicBool,
    syncing: AtomicBool,
}

impl ViewSync {
    pub fn new(
        original: Arc<dyn ComparisonViewer>,
        changed: Arc<dyn ComparisonViewer>,
        page_spacing: f32,
    ) -> Self {
        Self {
            original,
            changed,
            page_spacing,
            locked: AtomicBool::new(true),
            syncing: AtomicBool::new(false),
        }
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    /// Called from a viewer's scroll/zoom event. Returns whether the other
    /// viewer was updated.
    pub fn on_view_changed(&self, source: Side) -> Result<bool> {
        if !self.is_locked() {
            return Ok(false);
        }
        if self.syncing.swap(true, Ordering::SeqCst) {
            log::trace!("ignoring view change echoed from {source:?}");
            return Ok(false);
        }
        let _guard = SyncGuard(&self.syncing);

        let (from, to) = match source {
            Side::Original => (&self.original, &self.changed),
            Side::Changed => (&self.changed, &self.original),
        };
        let state = from.view_state();
        let current = to.view_state();

        let next = if state.page_index != current.page_index {
            // Page heights may differ between the documents; land on the page
            ViewState {
                page_index: state.page_index,
                scroll_top: page_offset(
                    to.as_ref(),
                    state.page_index,
                    state.zoom,
                    self.page_spacing,
                )?,
                zoom: state.zoom,
            }
        } else {
            ViewState {
                page_index: current.page_index,
                scroll_top: state.scroll_top,
                zoom: state.zoom,
            }
        };
        to.set_view_state(next);
        Ok(true)
    }
}
