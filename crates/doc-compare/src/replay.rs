//! Offline comparisons: a recorded hunk stream and in-memory viewers.
//!
//! Used by the command line tool to fold a captured comparison without a
//! live viewer SDK.

use crate::types::{AnnotationSpec, CompareError, PageComparison, Result, ViewState};
use crate::viewer::{ComparisonViewer, TextComparator};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordedPage {
    Failed { error: String },
    Compared(PageComparison),
}

/// A captured comparison: page geometry of both documents plus the
/// primitive's answer for each page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedComparison {
    pub original_page_heights: Vec<f32>,
    pub changed_page_heights: Vec<f32>,
    pub pages: Vec<RecordedPage>,
}

impl RecordedComparison {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_json(&text)
    }

    pub fn original_viewer(&self) -> MemoryViewer {
        MemoryViewer::new("original", self.original_page_heights.clone())
    }

    pub fn changed_viewer(&self) -> MemoryViewer {
        MemoryViewer::new("changed", self.changed_page_heights.clone())
    }

    pub fn comparator(&self) -> ReplayComparator {
        ReplayComparator {
            pages: self.pages.clone(),
        }
    }
}

pub struct ReplayComparator {
    pages: Vec<RecordedPage>,
}

impl ReplayComparator {
    pub fn new(pages: Vec<RecordedPage>) -> Self {
        Self { pages }
    }
}

#[async_trait]
impl TextComparator for ReplayComparator {
    async fn compare_page(&self, page_index: usize) -> Result<PageComparison> {
        match self.pages.get(page_index) {
            Some(RecordedPage::Compared(page)) => Ok(page.clone()),
            Some(RecordedPage::Failed { error }) => Err(CompareError::sdk(error.clone())),
            None => Err(CompareError::PageOutOfRange(page_index)),
        }
    }
}

type ViewListener = Arc<dyn Fn(ViewState) + Send + Sync>;

/// A viewer that keeps annotations and view state in memory
pub struct MemoryViewer {
    name: &'static str,
    page_heights: Vec<f32>,
    annotations: Mutex<IndexMap<String, AnnotationSpec>>,
    next_id: AtomicUsize,
    rejections: AtomicUsize,
    view: Mutex<ViewState>,
    listener: Mutex<Option<ViewListener>>,
}

impl MemoryViewer {
    pub fn new(name: &'static str, page_heights: Vec<f32>) -> Self {
        Self {
            name,
            page_heights,
            annotations: Mutex::new(IndexMap::new()),
            next_id: AtomicUsize::new(0),
            rejections: AtomicUsize::new(0),
            view: Mutex::new(ViewState::default()),
            listener: Mutex::new(None),
        }
    }

    pub fn annotations(&self) -> Vec<(String, AnnotationSpec)> {
        self.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, spec)| (id.clone(), spec.clone()))
            .collect()
    }

    /// Make the next `count` annotation creations fail
    pub fn reject_annotations(&self, count: usize) {
        self.rejections.store(count, Ordering::SeqCst);
    }

    /// Called after every view state change, like the SDK's scroll/zoom events
    pub fn on_view_change(&self, listener: impl Fn(ViewState) + Send + Sync + 'static) {
        *self.listener.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(listener));
    }
}

#[async_trait]
impl ComparisonViewer for MemoryViewer {
    async fn create_annotation(&self, spec: &AnnotationSpec) -> Result<String> {
        let rejected = self
            .rejections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(CompareError::sdk("annotation rejected"));
        }
        if spec.page_index >= self.page_heights.len() {
            return Err(CompareError::PageOutOfRange(spec.page_index));
        }
        let id = format!("{}-{}", self.name, self.next_id.fetch_add(1, Ordering::SeqCst));
        self.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), spec.clone());
        Ok(id)
    }

    async fn delete_annotation(&self, id: &str) -> Result<()> {
        self.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .shift_remove(id)
            .map(|_| ())
            .ok_or_else(|| CompareError::sdk(format!("no annotation {id}")))
    }

    fn page_count(&self) -> usize {
        self.page_heights.len()
    }

    fn page_height(&self, page_index: usize) -> Option<f32> {
        self.page_heights.get(page_index).copied()
    }

    fn view_state(&self) -> ViewState {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_view_state(&self, state: ViewState) {
        *self.view.lock().unwrap_or_else(PoisonError::into_inner) = state;
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(state);
        }
    }
}
