//! Contracts of the external collaborators the wizard drives.
//!
//! The authoring SDK, the merge service, the PDF viewer and the code editor
//! widget are all consumed through these traits. Handles are shared as
//! `Arc<dyn ...>` and stored in [`crate::WizardState`]; only the step that
//! created a handle ever destroys it.

use crate::data::DataPayload;
use crate::types::{Result, TargetSize, TemplateId};
use async_trait::async_trait;
use std::sync::Arc;

/// The UI element an editor or viewer is mounted into
#[async_trait]
pub trait MountTarget: Send + Sync {
    /// Attached to the live UI tree
    fn is_connected(&self) -> bool;
    fn size(&self) -> TargetSize;
    fn child_count(&self) -> usize;
    fn clear_children(&self);
    fn id(&self) -> Option<String>;
    fn set_id(&self, id: &str);
    /// Pin `position: relative` and `overflow: hidden` so the SDK measures a stable box
    fn stabilize(&self);
    /// Suspend until the next animation frame
    async fn next_frame(&self);
}

#[async_trait]
pub trait AuthoringService: Send + Sync {
    async fn create_session(&self) -> Result<Arc<dyn AuthoringSession>>;
}

#[async_trait]
pub trait AuthoringSession: Send + Sync {
    async fn import_binary(&self, bytes: &[u8]) -> Result<Arc<dyn AuthoredDocument>>;
    async fn load_structured_template(
        &self,
        template: &serde_json::Value,
    ) -> Result<Arc<dyn AuthoredDocument>>;
    /// May fail while the target is still being laid out
    async fn create_editor(
        &self,
        target: &dyn MountTarget,
        document: &Arc<dyn AuthoredDocument>,
    ) -> Result<Arc<dyn DocumentEditor>>;
}

#[async_trait]
pub trait AuthoredDocument: Send + Sync {
    async fn export_docx(&self) -> Result<Vec<u8>>;
    async fn export_pdf(&self) -> Result<Vec<u8>>;
}

#[async_trait]
pub trait DocumentEditor: Send + Sync {
    async fn destroy(&self) -> Result<()>;
}

/// Merge-field substitution over a DOCX buffer
pub trait MergeService: Send + Sync {
    fn populate_template(&self, document: &[u8], data: &DataPayload) -> Result<Vec<u8>>;
}

#[derive(Clone)]
pub struct ViewerLoadOptions {
    pub document: Arc<[u8]>,
    pub license_key: Option<String>,
}

#[async_trait]
pub trait ViewerService: Send + Sync {
    async fn load(
        &self,
        target: &dyn MountTarget,
        options: ViewerLoadOptions,
    ) -> Result<Arc<dyn ViewerInstance>>;
    async fn unload(&self, target: &dyn MountTarget) -> Result<()>;
}

#[async_trait]
pub trait ViewerInstance: Send + Sync {
    /// Export the document including any edits made in the viewer
    async fn export_pdf(&self) -> Result<Vec<u8>>;
}

/// A viewer together with the target it was loaded into; unloading always
/// goes to that target, even after the UI attached another one
#[derive(Clone)]
pub struct LoadedViewer {
    pub instance: Arc<dyn ViewerInstance>,
    pub target: Arc<dyn MountTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeEditorOptions {
    pub mode: &'static str,
    pub line_numbers: bool,
    pub tab_size: u8,
}

impl Default for CodeEditorOptions {
    fn default() -> Self {
        Self {
            mode: "application/json",
            line_numbers: true,
            tab_size: 2,
        }
    }
}

pub trait CodeEditorFactory: Send + Sync {
    fn from_text_area(
        &self,
        target: &dyn MountTarget,
        text: &str,
        options: &CodeEditorOptions,
    ) -> Result<Arc<dyn CodeEditor>>;
}

pub trait CodeEditor: Send + Sync {
    fn value(&self) -> String;
    fn set_value(&self, text: &str);
    /// Detach the widget and restore the plain text area
    fn to_text_area(&self);
}

/// Source of the demo templates and their sample data
pub trait TemplateCatalog: Send + Sync {
    fn structured_template(&self, id: TemplateId) -> Result<serde_json::Value>;
    fn default_data(&self, id: TemplateId) -> DataPayload;
}
