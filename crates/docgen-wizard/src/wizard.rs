//! The wizard session: store, navigation and the four step lifecycles.

use crate::data::DataEntry;
use crate::lifecycle::{
    DataEditorBinding, DocxEditorBinding, InitOutcome, PdfViewerBinding, StepLifecycle,
    TemplateEditorBinding,
};
use crate::navigation::{self, KeyInput, NavIntent, intent_for_key};
use crate::options::LifecycleOptions;
use crate::services::*;
use crate::state::{Action, WizardState};
use crate::steps::StepId;
use crate::store::WizardStore;
use crate::types::{Result, TemplateId, WizardError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// External collaborators the wizard drives
#[derive(Clone)]
pub struct Services {
    pub authoring: Arc<dyn AuthoringService>,
    pub merge: Arc<dyn MergeService>,
    pub viewer: Arc<dyn ViewerService>,
    pub code_editor: Arc<dyn CodeEditorFactory>,
    pub catalog: Arc<dyn TemplateCatalog>,
}

pub struct Wizard {
    store: WizardStore,
    template_editor: StepLifecycle<TemplateEditorBinding>,
    data_editor: StepLifecycle<DataEditorBinding>,
    docx_editor: StepLifecycle<DocxEditorBinding>,
    pdf_viewer: StepLifecycle<PdfViewerBinding>,
    data_entry: Mutex<DataEntry>,
}

impl Wizard {
    pub fn new(services: Services, options: LifecycleOptions) -> Self {
        let store = WizardStore::new();
        let license_key = options.license_key.clone();
        Self {
            template_editor: StepLifecycle::new(
                TemplateEditorBinding::new(services.authoring.clone(), services.catalog.clone()),
                store.clone(),
                options.clone(),
            ),
            data_editor: StepLifecycle::new(
                DataEditorBinding::new(services.code_editor, services.catalog),
                store.clone(),
                options.clone(),
            ),
            docx_editor: StepLifecycle::new(
                DocxEditorBinding::new(services.authoring, services.merge),
                store.clone(),
                options.clone(),
            ),
            pdf_viewer: StepLifecycle::new(
                PdfViewerBinding::new(services.viewer, license_key),
                store.clone(),
                options,
            ),
            store,
            data_entry: Mutex::new(DataEntry::default()),
        }
    }

    pub fn store(&self) -> &WizardStore {
        &self.store
    }

    pub fn snapshot(&self) -> WizardState {
        self.store.snapshot()
    }

    fn entry(&self) -> MutexGuard<'_, DataEntry> {
        self.data_entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hand a step its mount target; `None` when the target unmounts
    pub fn attach(&self, step: StepId, target: Option<Arc<dyn MountTarget>>) {
        match step {
            StepId::SelectTemplate => log::debug!("template selection has no mount target"),
            StepId::EditTemplate => self.template_editor.attach(target),
            StepId::FillData => self.data_editor.attach(target),
            StepId::GenerateDocx => self.docx_editor.attach(target),
            StepId::GeneratePdf => self.pdf_viewer.attach(target),
        }
    }

    /// Run the current step's initialization and mark it complete when live
    pub async fn activate(&self) -> InitOutcome {
        let step = self.store.read(|s| s.current_step());
        let outcome = match step {
            StepId::SelectTemplate => return InitOutcome::Skipped,
            StepId::EditTemplate => self.template_editor.ensure().await,
            StepId::FillData => self.data_editor.ensure().await,
            StepId::GenerateDocx => self.docx_editor.ensure().await,
            StepId::GeneratePdf => self.pdf_viewer.ensure().await,
        };
        if outcome.is_live() {
            if step == StepId::FillData {
                if let Some(editor) = self.store.read(|s| s.data_editor.clone()) {
                    self.edit_data(&editor.value());
                }
            } else {
                self.store.dispatch(Action::CompleteStep(step));
            }
        }
        outcome
    }

    fn on_select_step(&self) -> bool {
        self.store.read(|s| s.current_step()) == StepId::SelectTemplate
    }

    /// Switch templates, destroying everything built from the previous one first.
    /// Only the selection step accepts a template; returns whether it was taken.
    pub async fn select_template(&self, template: TemplateId) -> bool {
        if template == TemplateId::Custom {
            log::warn!("custom templates are selected by uploading a binary");
            return false;
        }
        if !self.on_select_step() {
            log::warn!("template selection ignored outside the first step");
            return false;
        }
        if self.store.read(|s| s.template == Some(template)) {
            self.store.dispatch(Action::CompleteStep(StepId::SelectTemplate));
            return true;
        }
        self.teardown_all().await;
        self.entry().reset();
        log::info!("template selected: {template}");
        self.store.dispatch(Action::SelectTemplate(template));
        self.store.dispatch(Action::CompleteStep(StepId::SelectTemplate));
        true
    }

    pub async fn select_custom_template(&self, bytes: Vec<u8>) -> Result<()> {
        if !self.on_select_step() {
            let step = self.store.read(|s| s.current_step());
            return Err(WizardError::WrongStep(step.slug()));
        }
        if bytes.is_empty() {
            return Err(WizardError::InvalidData(
                "uploaded template is empty".to_string(),
            ));
        }
        self.teardown_all().await;
        self.entry().reset();
        log::info!("custom template uploaded ({} bytes)", bytes.len());
        self.store
            .dispatch(Action::SelectCustomTemplate(Arc::from(bytes)));
        self.store.dispatch(Action::CompleteStep(StepId::SelectTemplate));
        Ok(())
    }

    /// Validate new data-step text. Only the data step accepts edits.
    pub fn edit_data(&self, text: &str) -> bool {
        if self.store.read(|s| s.current_step()) != StepId::FillData {
            log::debug!("data edit ignored outside the data step");
            return false;
        }
        let Some(payload) = self.entry().edit(text) else {
            return false;
        };
        self.store.dispatch(Action::SetDataJson(Some(payload)));
        self.store.dispatch(Action::CompleteStep(StepId::FillData));
        true
    }

    pub fn data_validation_error(&self) -> Option<String> {
        self.entry().validation_error().map(str::to_string)
    }

    pub async fn next(&self) -> bool {
        let step = self.store.read(|s| s.current_step());
        let mut blocked = false;
        if step == StepId::FillData {
            if let Some(editor) = self.store.read(|s| s.data_editor.clone()) {
                let text = editor.value();
                if text != self.entry().text() {
                    self.edit_data(&text);
                }
            }
            blocked = !self.entry().is_valid();
        }
        navigation::next(&self.store, blocked)
    }

    pub async fn previous(&self) -> bool {
        let Some(target) = self.store.read(|s| {
            navigation::can_go_previous(s).then(|| s.current_step_index - 1)
        }) else {
            return false;
        };
        self.teardown_after(target).await;
        navigation::previous(&self.store)
    }

    pub async fn go_to(&self, index: usize) -> bool {
        let (allowed, current) = self
            .store
            .read(|s| (navigation::can_go_to(s, index), s.current_step_index));
        if !allowed {
            return false;
        }
        if index < current {
            self.teardown_after(index).await;
        }
        navigation::go_to(&self.store, index)
    }

    pub async fn handle_key(&self, input: KeyInput) -> bool {
        match intent_for_key(input) {
            Some(NavIntent::Next) => self.next().await,
            Some(NavIntent::Previous) => self.previous().await,
            None => false,
        }
    }

    /// Clear the error and rerun the current step
    pub async fn try_again(&self) -> InitOutcome {
        self.store.dispatch(Action::SetError(None));
        self.activate().await
    }

    /// Tear everything down and return to the first step
    pub async fn reset(&self) {
        self.teardown_all().await;
        self.entry().reset();
        self.store.dispatch(Action::Reset);
    }

    /// Destroy all live handles, e.g. when the wizard unmounts
    pub async fn shutdown(&self) {
        self.teardown_all().await;
    }

    /// Final PDF bytes, including edits made in the viewer when it is live
    pub async fn export_pdf(&self) -> Result<Vec<u8>> {
        let (viewer, stored) = self
            .store
            .read(|s| (s.pdf_viewer.clone(), s.live_pdf_document()));
        match (viewer, stored) {
            (Some(viewer), _) => viewer.instance.export_pdf().await,
            (None, Some(bytes)) => Ok(bytes.to_vec()),
            (None, None) => Err(WizardError::MissingUpstream("PDF document")),
        }
    }

    /// Destroy handles whose artifacts are invalidated by returning to `index`
    async fn teardown_after(&self, index: usize) {
        if index < StepId::GeneratePdf.index() {
            self.pdf_viewer.teardown().await;
        }
        if index < StepId::GenerateDocx.index() {
            self.docx_editor.teardown().await;
        }
    }

    async fn teardown_all(&self) {
        self.pdf_viewer.teardown().await;
        self.docx_editor.teardown().await;
        self.data_editor.teardown().await;
        self.template_editor.teardown().await;
    }
}
