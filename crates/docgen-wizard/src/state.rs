//! The wizard's single mutable aggregate and its closed set of transitions.

use crate::data::DataPayload;
use crate::services::{AuthoredDocument, AuthoringSession, CodeEditor, DocumentEditor, LoadedViewer};
use crate::steps::{StepDescriptor, StepId, default_steps};
use crate::types::TemplateId;
use std::sync::Arc;

#[derive(Clone)]
pub struct WizardState {
    pub current_step_index: usize,
    pub steps: Vec<StepDescriptor>,
    pub template: Option<TemplateId>,
    /// Present only when `template == Some(TemplateId::Custom)`
    pub custom_template_binary: Option<Arc<[u8]>>,
    /// Authoring session shared by every step that needs one
    pub session: Option<Arc<dyn AuthoringSession>>,
    pub template_document: Option<Arc<dyn AuthoredDocument>>,
    pub template_editor: Option<Arc<dyn DocumentEditor>>,
    pub data_json: Option<DataPayload>,
    pub data_editor: Option<Arc<dyn CodeEditor>>,
    pub docx_document: Option<Arc<dyn AuthoredDocument>>,
    pub docx_editor: Option<Arc<dyn DocumentEditor>>,
    pub pdf_document: Option<Arc<[u8]>>,
    pub pdf_viewer: Option<LoadedViewer>,
    pub error: Option<String>,
    pub loading: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step_index: 0,
            steps: default_steps(),
            template: None,
            custom_template_binary: None,
            session: None,
            template_document: None,
            template_editor: None,
            data_json: None,
            data_editor: None,
            docx_document: None,
            docx_editor: None,
            pdf_document: None,
            pdf_viewer: None,
            error: None,
            loading: false,
        }
    }
}

impl std::fmt::Debug for WizardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardState")
            .field("current_step_index", &self.current_step_index)
            .field("template", &self.template)
            .field("session", &self.session.is_some())
            .field("template_document", &self.template_document.is_some())
            .field("template_editor", &self.template_editor.is_some())
            .field("data_json", &self.data_json.is_some())
            .field("data_editor", &self.data_editor.is_some())
            .field("docx_document", &self.docx_document.is_some())
            .field("docx_editor", &self.docx_editor.is_some())
            .field("pdf_document", &self.pdf_document.as_ref().map(|b| b.len()))
            .field("pdf_viewer", &self.pdf_viewer.is_some())
            .field("error", &self.error)
            .field("loading", &self.loading)
            .finish()
    }
}

impl WizardState {
    pub fn current_step(&self) -> StepId {
        StepId::from_index(self.current_step_index).unwrap_or(StepId::SelectTemplate)
    }

    pub fn is_first_step(&self) -> bool {
        self.current_step_index == 0
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step_index + 1 >= self.steps.len()
    }

    pub fn is_step_complete(&self, step: StepId) -> bool {
        self.steps.get(step.index()).is_some_and(|s| s.is_complete)
    }

    /// Exported PDF bytes, unless the buffer was handed off and left empty
    pub fn live_pdf_document(&self) -> Option<Arc<[u8]>> {
        self.pdf_document.clone().filter(|bytes| !bytes.is_empty())
    }

    fn set_index(&mut self, index: usize) {
        self.current_step_index = index;
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.is_active = i == index;
        }
    }

    /// Drop artifacts derived for steps after `index`.
    ///
    /// User input (template choice, template edits, data) survives; merged
    /// documents and their editors/viewers do not.
    fn invalidate_after(&mut self, index: usize) {
        if index < StepId::GenerateDocx.index() {
            self.docx_document = None;
            self.docx_editor = None;
        }
        if index < StepId::GeneratePdf.index() {
            self.pdf_document = None;
            self.pdf_viewer = None;
        }
    }

    fn clear_template_artifacts(&mut self) {
        self.template_document = None;
        self.template_editor = None;
        self.data_json = None;
        self.data_editor = None;
        self.docx_document = None;
        self.docx_editor = None;
        self.pdf_document = None;
        self.pdf_viewer = None;
    }
}

/// Named transitions; the only way to mutate [`WizardState`]
#[derive(Clone)]
pub enum Action {
    SelectTemplate(TemplateId),
    SelectCustomTemplate(Arc<[u8]>),
    SetSession(Arc<dyn AuthoringSession>),
    SetTemplateDocument(Option<Arc<dyn AuthoredDocument>>),
    SetTemplateEditor(Option<Arc<dyn DocumentEditor>>),
    SetDataJson(Option<DataPayload>),
    SetDataEditor(Option<Arc<dyn CodeEditor>>),
    SetDocxDocument(Option<Arc<dyn AuthoredDocument>>),
    SetDocxEditor(Option<Arc<dyn DocumentEditor>>),
    SetPdfDocument(Option<Arc<[u8]>>),
    SetPdfViewer(Option<LoadedViewer>),
    SetLoading(bool),
    SetError(Option<String>),
    Next,
    Previous,
    GoTo(usize),
    CompleteStep(StepId),
    Reset,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::SelectTemplate(_) => "select_template",
            Action::SelectCustomTemplate(_) => "select_custom_template",
            Action::SetSession(_) => "set_session",
            Action::SetTemplateDocument(_) => "set_template_document",
            Action::SetTemplateEditor(_) => "set_template_editor",
            Action::SetDataJson(_) => "set_data_json",
            Action::SetDataEditor(_) => "set_data_editor",
            Action::SetDocxDocument(_) => "set_docx_document",
            Action::SetDocxEditor(_) => "set_docx_editor",
            Action::SetPdfDocument(_) => "set_pdf_document",
            Action::SetPdfViewer(_) => "set_pdf_viewer",
            Action::SetLoading(_) => "set_loading",
            Action::SetError(_) => "set_error",
            Action::Next => "next",
            Action::Previous => "previous",
            Action::GoTo(_) => "go_to",
            Action::CompleteStep(_) => "complete_step",
            Action::Reset => "reset",
        }
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::SelectTemplate(id) => write!(f, "SelectTemplate({id})"),
            Action::SetLoading(v) => write!(f, "SetLoading({v})"),
            Action::SetError(e) => write!(f, "SetError({e:?})"),
            Action::GoTo(i) => write!(f, "GoTo({i})"),
            Action::CompleteStep(s) => write!(f, "CompleteStep({s:?})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Apply one transition. Out-of-range navigation is a no-op.
pub fn reduce(state: &mut WizardState, action: Action) {
    match action {
        Action::SelectTemplate(id) => {
            state.template = Some(id);
            state.custom_template_binary = None;
            state.clear_template_artifacts();
        }
        Action::SelectCustomTemplate(bytes) => {
            state.template = Some(TemplateId::Custom);
            state.custom_template_binary = Some(bytes);
            state.clear_template_artifacts();
        }
        Action::SetSession(session) => state.session = Some(session),
        Action::SetTemplateDocument(doc) => state.template_document = doc,
        Action::SetTemplateEditor(editor) => state.template_editor = editor,
        Action::SetDataJson(data) => state.data_json = data,
        Action::SetDataEditor(editor) => state.data_editor = editor,
        Action::SetDocxDocument(doc) => state.docx_document = doc,
        Action::SetDocxEditor(editor) => state.docx_editor = editor,
        Action::SetPdfDocument(bytes) => state.pdf_document = bytes,
        Action::SetPdfViewer(viewer) => state.pdf_viewer = viewer,
        Action::SetLoading(loading) => state.loading = loading,
        Action::SetError(error) => state.error = error,
        Action::Next => {
            if !state.is_last_step() {
                state.set_index(state.current_step_index + 1);
            }
        }
        Action::Previous => {
            if !state.is_first_step() {
                let index = state.current_step_index - 1;
                state.invalidate_after(index);
                state.set_index(index);
            }
        }
        Action::GoTo(index) => {
            if index < state.steps.len() {
                if index < state.current_step_index {
                    state.invalidate_after(index);
                }
                state.set_index(index);
            }
        }
        Action::CompleteStep(id) => {
            if let Some(step) = state.steps.get_mut(id.index()) {
                step.is_complete = true;
            }
        }
        Action::Reset => *state = WizardState::default(),
    }
}
