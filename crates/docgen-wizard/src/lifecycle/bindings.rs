use super::{Liveness, StepBinding};
use crate::services::*;
use crate::state::{Action, WizardState};
use crate::steps::StepId;
use crate::store::WizardStore;
use crate::types::{Result, TemplateId, WizardError};
use async_trait::async_trait;
use std::sync::Arc;

fn same_arc<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn same_opt<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_arc(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Reuse the session cached in the store or create it once
async fn ensure_session(
    store: &WizardStore,
    authoring: &dyn AuthoringService,
) -> Result<Arc<dyn AuthoringSession>> {
    if let Some(session) = store.read(|s| s.session.clone()) {
        return Ok(session);
    }
    let session = authoring.create_session().await?;
    // Another step may have won the race while we were waiting
    if let Some(existing) = store.read(|s| s.session.clone()) {
        return Ok(existing);
    }
    log::info!("authoring session created");
    store.dispatch(Action::SetSession(session.clone()));
    Ok(session)
}

/// A session plus the document an editor is bound to
#[derive(Clone)]
pub struct EditorArtifact {
    pub session: Arc<dyn AuthoringSession>,
    pub document: Arc<dyn AuthoredDocument>,
}

// ------------------------------------------------------------
// template editor
// ------------------------------------------------------------

pub struct TemplateEditorBinding {
    authoring: Arc<dyn AuthoringService>,
    catalog: Arc<dyn TemplateCatalog>,
}

impl TemplateEditorBinding {
    pub fn new(authoring: Arc<dyn AuthoringService>, catalog: Arc<dyn TemplateCatalog>) -> Self {
        Self { authoring, catalog }
    }
}

#[async_trait]
impl StepBinding for TemplateEditorBinding {
    type Handle = Arc<dyn DocumentEditor>;
    type Artifact = EditorArtifact;

    fn step(&self) -> StepId {
        StepId::EditTemplate
    }

    fn describe(&self) -> &'static str {
        "the template editor"
    }

    fn handle(&self, state: &WizardState) -> Option<Self::Handle> {
        state.template_editor.clone()
    }

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action {
        Action::SetTemplateEditor(handle)
    }

    fn upstream_ready(&self, state: &WizardState) -> bool {
        match state.template {
            Some(TemplateId::Custom) => state.custom_template_binary.is_some(),
            Some(_) => true,
            None => false,
        }
    }

    async fn prepare(
        &self,
        store: &WizardStore,
        live: Liveness<'_>,
    ) -> Result<Option<EditorArtifact>> {
        let session = ensure_session(store, self.authoring.as_ref()).await?;
        if !live() {
            return Ok(None);
        }
        let (template, custom, existing) = store.read(|s| {
            (
                s.template,
                s.custom_template_binary.clone(),
                s.template_document.clone(),
            )
        });
        if let Some(document) = existing {
            return Ok(Some(EditorArtifact { session, document }));
        }
        let Some(template) = template else {
            return Ok(None);
        };

        let document = match template {
            TemplateId::Custom => {
                let bytes = custom
                    .clone()
                    .ok_or(WizardError::MissingUpstream("custom template binary"))?;
                session.import_binary(&bytes).await?
            }
            id => {
                let structure = self.catalog.structured_template(id)?;
                session.load_structured_template(&structure).await?
            }
        };
        if !live() {
            log::debug!("template editor left while loading {template}");
            return Ok(None);
        }

        let unchanged = store.read(|s| {
            s.template == Some(template)
                && same_opt(&s.custom_template_binary, &custom)
                && s.template_document.is_none()
        });
        if !unchanged {
            log::info!("template changed while loading {template}, dropping document");
            return Ok(None);
        }
        store.dispatch(Action::SetTemplateDocument(Some(document.clone())));
        Ok(Some(EditorArtifact { session, document }))
    }

    async fn create(
        &self,
        target: &Arc<dyn MountTarget>,
        artifact: &EditorArtifact,
    ) -> Result<Self::Handle> {
        artifact
            .session
            .create_editor(target.as_ref(), &artifact.document)
            .await
    }

    async fn destroy(&self, handle: Self::Handle) -> Result<()> {
        handle.destroy().await
    }
}

// ------------------------------------------------------------
// data editor
// ------------------------------------------------------------

pub struct DataEditorBinding {
    factory: Arc<dyn CodeEditorFactory>,
    catalog: Arc<dyn TemplateCatalog>,
    options: CodeEditorOptions,
}

impl DataEditorBinding {
    pub fn new(factory: Arc<dyn CodeEditorFactory>, catalog: Arc<dyn TemplateCatalog>) -> Self {
        Self {
            factory,
            catalog,
            options: CodeEditorOptions::default(),
        }
    }
}

#[async_trait]
impl StepBinding for DataEditorBinding {
    type Handle = Arc<dyn CodeEditor>;
    type Artifact = String;

    fn step(&self) -> StepId {
        StepId::FillData
    }

    fn describe(&self) -> &'static str {
        "the data editor"
    }

    fn handle(&self, state: &WizardState) -> Option<Self::Handle> {
        state.data_editor.clone()
    }

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action {
        Action::SetDataEditor(handle)
    }

    fn upstream_ready(&self, state: &WizardState) -> bool {
        state.template.is_some() && state.template_document.is_some()
    }

    async fn prepare(&self, store: &WizardStore, _live: Liveness<'_>) -> Result<Option<String>> {
        let (template, existing) = store.read(|s| (s.template, s.data_json.clone()));
        let Some(template) = template else {
            return Ok(None);
        };
        let payload = match existing {
            Some(payload) => payload,
            None => {
                let payload = self.catalog.default_data(template);
                store.dispatch(Action::SetDataJson(Some(payload.clone())));
                payload
            }
        };
        Ok(Some(payload.to_pretty_json()?))
    }

    async fn create(&self, target: &Arc<dyn MountTarget>, text: &String) -> Result<Self::Handle> {
        self.factory.from_text_area(target.as_ref(), text, &self.options)
    }

    async fn destroy(&self, handle: Self::Handle) -> Result<()> {
        handle.to_text_area();
        Ok(())
    }
}

// ------------------------------------------------------------
// generated DOCX editor
// ------------------------------------------------------------

pub struct DocxEditorBinding {
    authoring: Arc<dyn AuthoringService>,
    merge: Arc<dyn MergeService>,
}

impl DocxEditorBinding {
    pub fn new(authoring: Arc<dyn AuthoringService>, merge: Arc<dyn MergeService>) -> Self {
        Self { authoring, merge }
    }
}

#[async_trait]
impl StepBinding for DocxEditorBinding {
    type Handle = Arc<dyn DocumentEditor>;
    type Artifact = EditorArtifact;

    fn step(&self) -> StepId {
        StepId::GenerateDocx
    }

    fn describe(&self) -> &'static str {
        "the generated document"
    }

    fn handle(&self, state: &WizardState) -> Option<Self::Handle> {
        state.docx_editor.clone()
    }

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action {
        Action::SetDocxEditor(handle)
    }

    fn upstream_ready(&self, state: &WizardState) -> bool {
        state.template_document.is_some() && state.data_json.is_some()
    }

    async fn prepare(
        &self,
        store: &WizardStore,
        live: Liveness<'_>,
    ) -> Result<Option<EditorArtifact>> {
        let session = ensure_session(store, self.authoring.as_ref()).await?;
        if !live() {
            return Ok(None);
        }
        let (template_document, data, existing) = store.read(|s| {
            (
                s.template_document.clone(),
                s.data_json.clone(),
                s.docx_document.clone(),
            )
        });
        if let Some(document) = existing {
            return Ok(Some(EditorArtifact { session, document }));
        }
        let (Some(template_document), Some(data)) = (template_document, data) else {
            return Ok(None);
        };

        let template_bytes = template_document.export_docx().await?;
        if !live() {
            return Ok(None);
        }
        let merged = self.merge.populate_template(&template_bytes, &data)?;
        let document = session.import_binary(&merged).await?;
        if !live() {
            log::debug!("generated document step left while importing");
            return Ok(None);
        }

        let unchanged = store.read(|s| {
            s.template_document
                .as_ref()
                .is_some_and(|d| same_arc(d, &template_document))
                && s.data_json.as_ref() == Some(&data)
                && s.docx_document.is_none()
        });
        if !unchanged {
            log::info!("template or data changed while merging, dropping document");
            return Ok(None);
        }
        log::info!("merged {} bytes into generated document", merged.len());
        store.dispatch(Action::SetDocxDocument(Some(document.clone())));
        Ok(Some(EditorArtifact { session, document }))
    }

    async fn create(
        &self,
        target: &Arc<dyn MountTarget>,
        artifact: &EditorArtifact,
    ) -> Result<Self::Handle> {
        artifact
            .session
            .create_editor(target.as_ref(), &artifact.document)
            .await
    }

    async fn destroy(&self, handle: Self::Handle) -> Result<()> {
        handle.destroy().await
    }
}

// ------------------------------------------------------------
// PDF viewer
// ------------------------------------------------------------

pub struct PdfViewerBinding {
    viewer: Arc<dyn ViewerService>,
    license_key: Option<String>,
}

impl PdfViewerBinding {
    pub fn new(viewer: Arc<dyn ViewerService>, license_key: Option<String>) -> Self {
        Self {
            viewer,
            license_key,
        }
    }
}

#[async_trait]
impl StepBinding for PdfViewerBinding {
    type Handle = LoadedViewer;
    type Artifact = Arc<[u8]>;

    fn step(&self) -> StepId {
        StepId::GeneratePdf
    }

    fn describe(&self) -> &'static str {
        "the PDF viewer"
    }

    fn handle(&self, state: &WizardState) -> Option<Self::Handle> {
        state.pdf_viewer.clone()
    }

    fn store_handle(&self, handle: Option<Self::Handle>) -> Action {
        Action::SetPdfViewer(handle)
    }

    fn upstream_ready(&self, state: &WizardState) -> bool {
        state.docx_document.is_some()
    }

    async fn prepare(
        &self,
        store: &WizardStore,
        live: Liveness<'_>,
    ) -> Result<Option<Arc<[u8]>>> {
        let (docx, existing) = store.read(|s| (s.docx_document.clone(), s.live_pdf_document()));
        if let Some(bytes) = existing {
            return Ok(Some(bytes));
        }
        let Some(docx) = docx else {
            return Ok(None);
        };

        let bytes: Arc<[u8]> = Arc::from(docx.export_pdf().await?);
        if !live() {
            return Ok(None);
        }
        let unchanged = store.read(|s| {
            s.docx_document
                .as_ref()
                .is_some_and(|d| same_arc(d, &docx))
        });
        if !unchanged {
            return Ok(None);
        }
        log::info!("exported PDF ({} bytes)", bytes.len());
        store.dispatch(Action::SetPdfDocument(Some(bytes.clone())));
        Ok(Some(bytes))
    }

    async fn create(
        &self,
        target: &Arc<dyn MountTarget>,
        bytes: &Arc<[u8]>,
    ) -> Result<LoadedViewer> {
        let options = ViewerLoadOptions {
            document: bytes.clone(),
            license_key: self.license_key.clone(),
        };
        let instance = self.viewer.load(target.as_ref(), options).await?;
        Ok(LoadedViewer {
            instance,
            target: target.clone(),
        })
    }

    async fn destroy(&self, handle: LoadedViewer) -> Result<()> {
        self.viewer.unload(handle.target.as_ref()).await
    }
}

