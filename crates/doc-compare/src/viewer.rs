use crate::types::{AnnotationSpec, CompareError, PageComparison, Result, ViewState};
use async_trait::async_trait;

/// One of the two viewer instances taking part in a comparison
#[async_trait]
pub trait ComparisonViewer: Send + Sync {
    /// Returns the id of the new annotation
    async fn create_annotation(&self, spec: &AnnotationSpec) -> Result<String>;

    async fn delete_annotation(&self, id: &str) -> Result<()>;

    fn page_count(&self) -> usize;

    /// Unzoomed page height, `None` past the last page
    fn page_height(&self, page_index: usize) -> Option<f32>;

    fn view_state(&self) -> ViewState;

    fn set_view_state(&self, state: ViewState);
}

/// The per-page text comparison primitive
#[async_trait]
pub trait TextComparator: Send + Sync {
    async fn compare_page(&self, page_index: usize) -> Result<PageComparison>;
}

/// Scroll offset of the top of `page_index`: the rendered heights of all
/// prior pages at `zoom`, plus the gap after each.
pub fn page_offset(
    viewer: &dyn ComparisonViewer,
    page_index: usize,
    zoom: f32,
    page_spacing: f32,
) -> Result<f32> {
    let mut offset = 0.0;
    for page in 0..page_index {
        let height = viewer
            .page_height(page)
            .ok_or(CompareError::PageOutOfRange(page))?;
        offset += height * zoom + page_spacing;
    }
    Ok(offset)
}
