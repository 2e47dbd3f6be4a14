//! Running a comparison against two viewers and navigating its changes.

use crate::fold::{ChangeSet, PlannedChange, plan_page};
use crate::types::{
    AnnotationSpec, ChangeRecord, CompareError, ComparisonReport, OperationKind, Result, Side,
    ViewState,
};
use crate::viewer::{ComparisonViewer, TextComparator, page_offset};
use std::sync::Arc;

/// Gap between rendered pages, in pixels
pub const DEFAULT_PAGE_SPACING: f32 = 20.0;

pub struct ComparisonSession {
    original: Arc<dyn ComparisonViewer>,
    changed: Arc<dyn ComparisonViewer>,
    comparator: Arc<dyn TextComparator>,
    page_spacing: f32,
    changes: ChangeSet,
    highlights: Vec<(Side, String)>,
    selection: Vec<(Side, String)>,
    selected: Option<usize>,
}

impl ComparisonSession {
    pub fn new(
        original: Arc<dyn ComparisonViewer>,
        changed: Arc<dyn ComparisonViewer>,
        comparator: Arc<dyn TextComparator>,
    ) -> Self {
        Self {
            original,
            changed,
            comparator,
            page_spacing: DEFAULT_PAGE_SPACING,
            changes: ChangeSet::new(),
            highlights: Vec::new(),
            selection: Vec::new(),
            selected: None,
        }
    }

    pub fn with_page_spacing(mut self, page_spacing: f32) -> Self {
        self.page_spacing = page_spacing;
        self
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    fn viewer(&self, side: Side) -> &dyn ComparisonViewer {
        match side {
            Side::Original => self.original.as_ref(),
            Side::Changed => self.changed.as_ref(),
        }
    }

    /// Compare every page and highlight the differences.
    ///
    /// Annotations of a previous run are removed first. A page whose
    /// comparison fails is skipped; a highlight the viewer refuses is
    /// logged and left out.
    pub async fn run(&mut self) -> Result<ComparisonReport> {
        self.clear().await;

        let original_pages = self.original.page_count();
        let changed_pages = self.changed.page_count();
        if original_pages != changed_pages {
            log::warn!(
                "page counts differ ({original_pages} vs {changed_pages}), comparing the first {}",
                original_pages.min(changed_pages)
            );
        }
        let pages = original_pages.min(changed_pages);

        let mut report = ComparisonReport {
            pages_compared: pages,
            ..Default::default()
        };
        for page_index in 0..pages {
            let comparison = match self.comparator.compare_page(page_index).await {
                Ok(comparison) => comparison,
                Err(e) => {
                    log::warn!("comparison of page {page_index} failed, skipping: {e}");
                    report.skipped_pages.push(page_index);
                    continue;
                }
            };
            for change in plan_page(&comparison) {
                let index = self.changes.record(page_index, change);
                report.missing_highlights += self.highlight(page_index, index, change).await;
            }
        }
        report.changes = self.changes.len();
        log::info!(
            "comparison found {} changes on {} pages",
            report.changes,
            pages - report.skipped_pages.len()
        );
        Ok(report)
    }

    /// Create the highlights for one change; returns how many failed
    async fn highlight(
        &mut self,
        page_index: usize,
        index: usize,
        change: PlannedChange<'_>,
    ) -> usize {
        let ops = match change {
            PlannedChange::Replace { delete, insert } => vec![delete, insert],
            PlannedChange::Single(op) => vec![op],
        };
        let mut failed = 0;
        for op in ops {
            let side = match op.kind {
                OperationKind::Insert => Side::Changed,
                _ => Side::Original,
            };
            let spec = AnnotationSpec::highlight(page_index, op.rect, op.kind);
            match self.viewer(side).create_annotation(&spec).await {
                Ok(id) => {
                    self.changes.attach_annotation(index, id.clone());
                    self.highlights.push((side, id));
                }
                Err(e) => {
                    log::warn!("could not highlight {:?} on page {page_index}: {e}", op.text);
                    failed += 1;
                }
            }
        }
        failed
    }

    async fn delete_all(&self, annotations: Vec<(Side, String)>) {
        for (side, id) in annotations {
            if let Err(e) = self.viewer(side).delete_annotation(&id).await {
                log::warn!("could not delete annotation {id}: {e}");
            }
        }
    }

    /// Remove every highlight and selection of the current run
    pub async fn clear(&mut self) {
        let selection = std::mem::take(&mut self.selection);
        self.delete_all(selection).await;
        let highlights = std::mem::take(&mut self.highlights);
        self.delete_all(highlights).await;
        self.changes.clear();
        self.selected = None;
    }

    /// Scroll both viewers to the change's page and outline it
    pub async fn jump_to(&mut self, index: usize) -> Result<&ChangeRecord> {
        let record = self
            .changes
            .get(index)
            .cloned()
            .ok_or(CompareError::ChangeOutOfRange(index))?;

        for side in [Side::Original, Side::Changed] {
            let viewer = self.viewer(side);
            let zoom = viewer.view_state().zoom;
            let scroll_top = page_offset(viewer, record.page_index, zoom, self.page_spacing)?;
            viewer.set_view_state(ViewState {
                page_index: record.page_index,
                scroll_top,
                zoom,
            });
        }

        let previous = std::mem::take(&mut self.selection);
        self.delete_all(previous).await;
        let rects = [
            (Side::Original, record.original_rect),
            (Side::Changed, record.changed_rect),
        ];
        for (side, rect) in rects {
            let Some(rect) = rect else {
                continue;
            };
            let spec = AnnotationSpec::selection(record.page_index, rect);
            match self.viewer(side).create_annotation(&spec).await {
                Ok(id) => self.selection.push((side, id)),
                Err(e) => log::warn!("could not draw selection for change {index}: {e}"),
            }
        }

        self.selected = Some(index);
        self.changes
            .get(index)
            .ok_or(CompareError::ChangeOutOfRange(index))
    }

    /// `Ok(None)` at the last change
    pub async fn next_change(&mut self) -> Result<Option<usize>> {
        let target = self.selected.map_or(0, |i| i + 1);
        if target >= self.changes.len() {
            return Ok(None);
        }
        self.jump_to(target).await?;
        Ok(Some(target))
    }

    /// `Ok(None)` at the first change or with nothing selected
    pub async fn previous_change(&mut self) -> Result<Option<usize>> {
        let Some(target) = self.selected.and_then(|i| i.checked_sub(1)) else {
            return Ok(None);
        };
        self.jump_to(target).await?;
        Ok(Some(target))
    }

    /// Jump to the change an on-page highlight belongs to
    pub async fn select_annotation(&mut self, id: &str) -> Result<usize> {
        let index = self
            .changes
            .index_of_annotation(id)
            .ok_or_else(|| CompareError::UnknownAnnotation(id.to_string()))?;
        self.jump_to(index).await?;
        Ok(index)
    }
}
