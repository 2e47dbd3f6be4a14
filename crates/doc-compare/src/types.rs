use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompareError {
    #[error("SDK error: {0}")]
    Sdk(String),
    #[error("Page {0} is out of range")]
    PageOutOfRange(usize),
    #[error("No change at index {0}")]
    ChangeOutOfRange(usize),
    #[error("Unknown annotation: {0}")]
    UnknownAnnotation(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompareError {
    pub fn sdk(message: impl Into<String>) -> Self {
        CompareError::Sdk(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;

/// Page-space rectangle in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// `"left,top"`, the key changes are grouped by
    pub fn origin_key(&self) -> String {
        format!("{},{}", self.left, self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Delete,
    Insert,
    Equal,
}

/// One diff operation. `rect` lives in the original document for deletes
/// and in the changed document for inserts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub text: String,
    pub rect: Rect,
}

impl Operation {
    pub fn new(kind: OperationKind, text: impl Into<String>, rect: Rect) -> Self {
        Self {
            kind,
            text: text.into(),
            rect,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hunk {
    pub operations: Vec<Operation>,
}

/// Output of the comparison primitive for one page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageComparison {
    pub hunks: Vec<Hunk>,
}

/// Which of the two viewers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Original,
    Changed,
}

/// Identifies a change: page plus rectangle origin
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ChangeKey {
    pub page_index: usize,
    pub origin: String,
}

impl ChangeKey {
    pub fn new(page_index: usize, rect: &Rect) -> Self {
        Self {
            page_index,
            origin: rect.origin_key(),
        }
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.page_index, self.origin)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeRecord {
    pub page_index: usize,
    pub delete_text: Option<String>,
    pub insert_text: Option<String>,
    pub del: bool,
    pub insert: bool,
    pub original_rect: Option<Rect>,
    pub changed_rect: Option<Rect>,
    pub annotation_ids: Vec<String>,
}

impl ChangeRecord {
    pub fn is_replace(&self) -> bool {
        self.del && self.insert
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color { r: 255, g: 0, b: 0 };
    pub const GREEN: Color = Color { r: 0, g: 160, b: 0 };
    pub const BLUE: Color = Color { r: 0, g: 90, b: 255 };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AnnotationStyle {
    /// Filled highlight over changed text
    Highlight(Color),
    /// Border-only rectangle around the selected change
    Selection(Color),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSpec {
    pub page_index: usize,
    pub rect: Rect,
    pub style: AnnotationStyle,
}

impl AnnotationSpec {
    pub fn highlight(page_index: usize, rect: Rect, kind: OperationKind) -> Self {
        let color = match kind {
            OperationKind::Insert => Color::GREEN,
            _ => Color::RED,
        };
        Self {
            page_index,
            rect,
            style: AnnotationStyle::Highlight(color),
        }
    }

    pub fn selection(page_index: usize, rect: Rect) -> Self {
        Self {
            page_index,
            rect,
            style: AnnotationStyle::Selection(Color::BLUE),
        }
    }
}

/// Scroll position and zoom of one viewer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub page_index: usize,
    pub scroll_top: f32,
    pub zoom: f32,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            page_index: 0,
            scroll_top: 0.0,
            zoom: 1.0,
        }
    }
}

/// Outcome of one comparison run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub pages_compared: usize,
    pub changes: usize,
    /// Pages whose comparison call failed
    pub skipped_pages: Vec<usize>,
    /// Highlights the viewer refused to create
    pub missing_highlights: usize,
}
