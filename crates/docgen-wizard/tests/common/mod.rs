#![allow(dead_code)]

use async_trait::async_trait;
use docgen_wizard::services::*;
use docgen_wizard::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered record of every SDK call, shared by all fakes
#[derive(Default)]
pub struct Journal(Mutex<Vec<String>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

pub struct FakeTarget {
    connected: AtomicBool,
    size: Mutex<TargetSize>,
    children: AtomicUsize,
    id: Mutex<Option<String>>,
    pub stabilized: AtomicBool,
}

impl FakeTarget {
    pub fn ready(id: &str) -> Arc<Self> {
        Arc::new(Self {
            connected: AtomicBool::new(true),
            size: Mutex::new(TargetSize::new(800.0, 600.0)),
            children: AtomicUsize::new(0),
            id: Mutex::new(Some(id.to_string())),
            stabilized: AtomicBool::new(false),
        })
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn set_size(&self, width: f32, height: f32) {
        *self.size.lock().unwrap() = TargetSize::new(width, height);
    }

    pub fn clear_id(&self) {
        *self.id.lock().unwrap() = None;
    }

    pub fn fill(&self) {
        self.children.fetch_add(1, Ordering::SeqCst);
    }

    /// Simulates the UI remounting the element without the SDK object
    pub fn empty(&self) {
        self.children.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl MountTarget for FakeTarget {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn size(&self) -> TargetSize {
        *self.size.lock().unwrap()
    }

    fn child_count(&self) -> usize {
        self.children.load(Ordering::SeqCst)
    }

    fn clear_children(&self) {
        self.children.store(0, Ordering::SeqCst);
    }

    fn id(&self) -> Option<String> {
        self.id.lock().unwrap().clone()
    }

    fn set_id(&self, id: &str) {
        *self.id.lock().unwrap() = Some(id.to_string());
    }

    fn stabilize(&self) {
        self.stabilized.store(true, Ordering::SeqCst);
    }

    async fn next_frame(&self) {
        tokio::task::yield_now().await;
    }
}

/// Lets the SDK fakes put content into the target they were mounted into
#[derive(Default)]
pub struct Dom(Mutex<HashMap<String, Arc<FakeTarget>>>);

impl Dom {
    pub fn register(&self, target: &Arc<FakeTarget>) {
        let id = target.id().unwrap();
        self.0.lock().unwrap().insert(id, target.clone());
    }

    pub fn fill(&self, target: &dyn MountTarget) {
        if let Some(id) = target.id() {
            if let Some(t) = self.0.lock().unwrap().get(&id) {
                t.fill();
            }
        }
    }
}

#[derive(Default)]
pub struct Faults {
    /// Upcoming `create_editor` calls that fail
    pub editor_failures: AtomicUsize,
    /// Upcoming `load` calls on the viewer that fail
    pub viewer_failures: AtomicUsize,
    pub destroy_fails: AtomicBool,
    /// Target detached when an editor creation fails
    pub detach_on_failure: Mutex<Option<Arc<FakeTarget>>>,
    /// Target detached while the authoring session is being created
    pub detach_on_session: Mutex<Option<Arc<FakeTarget>>>,
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

pub struct FakeDocument {
    pub name: String,
}

#[async_trait]
impl AuthoredDocument for FakeDocument {
    async fn export_docx(&self) -> Result<Vec<u8>> {
        Ok(format!("docx:{}", self.name).into_bytes())
    }

    async fn export_pdf(&self) -> Result<Vec<u8>> {
        Ok(format!("%PDF-{}", self.name).into_bytes())
    }
}

pub struct FakeEditor {
    name: String,
    journal: Arc<Journal>,
    faults: Arc<Faults>,
}

#[async_trait]
impl DocumentEditor for FakeEditor {
    async fn destroy(&self) -> Result<()> {
        self.journal.push(format!("destroy_editor:{}", self.name));
        if self.faults.destroy_fails.load(Ordering::SeqCst) {
            return Err(WizardError::sdk("editor already detached"));
        }
        Ok(())
    }
}

pub struct FakeSession {
    journal: Arc<Journal>,
    dom: Arc<Dom>,
    faults: Arc<Faults>,
}

#[async_trait]
impl AuthoringSession for FakeSession {
    async fn import_binary(&self, bytes: &[u8]) -> Result<Arc<dyn AuthoredDocument>> {
        let name = String::from_utf8_lossy(bytes).to_string();
        self.journal.push(format!("import_binary:{name}"));
        tokio::task::yield_now().await;
        Ok(Arc::new(FakeDocument { name }))
    }

    async fn load_structured_template(
        &self,
        template: &serde_json::Value,
    ) -> Result<Arc<dyn AuthoredDocument>> {
        let name = template["name"].as_str().unwrap_or("unnamed").to_string();
        self.journal.push(format!("load_template:{name}"));
        tokio::task::yield_now().await;
        Ok(Arc::new(FakeDocument { name }))
    }

    async fn create_editor(
        &self,
        target: &dyn MountTarget,
        document: &Arc<dyn AuthoredDocument>,
    ) -> Result<Arc<dyn DocumentEditor>> {
        let _ = document;
        let id = target.id().unwrap_or_default();
        if take_failure(&self.faults.editor_failures) {
            self.journal.push(format!("create_editor_failed:{id}"));
            if let Some(t) = self.faults.detach_on_failure.lock().unwrap().as_ref() {
                t.set_connected(false);
            }
            return Err(WizardError::sdk("target is not stable"));
        }
        self.journal.push(format!("create_editor:{id}"));
        self.dom.fill(target);
        Ok(Arc::new(FakeEditor {
            name: id,
            journal: self.journal.clone(),
            faults: self.faults.clone(),
        }))
    }
}

pub struct FakeAuthoring {
    journal: Arc<Journal>,
    dom: Arc<Dom>,
    faults: Arc<Faults>,
}

#[async_trait]
impl AuthoringService for FakeAuthoring {
    async fn create_session(&self) -> Result<Arc<dyn AuthoringSession>> {
        self.journal.push("create_session");
        if let Some(t) = self.faults.detach_on_session.lock().unwrap().as_ref() {
            t.set_connected(false);
        }
        tokio::task::yield_now().await;
        Ok(Arc::new(FakeSession {
            journal: self.journal.clone(),
            dom: self.dom.clone(),
            faults: self.faults.clone(),
        }))
    }
}

pub struct FakeMerge {
    journal: Arc<Journal>,
}

impl MergeService for FakeMerge {
    fn populate_template(&self, document: &[u8], data: &DataPayload) -> Result<Vec<u8>> {
        self.journal.push("populate");
        let mut merged = document.to_vec();
        for key in data.model.keys() {
            merged.extend_from_slice(format!("+{key}").as_bytes());
        }
        Ok(merged)
    }
}

pub struct FakeViewerInstance;

#[async_trait]
impl ViewerInstance for FakeViewerInstance {
    async fn export_pdf(&self) -> Result<Vec<u8>> {
        Ok(b"%PDF-annotated".to_vec())
    }
}

pub struct FakeViewer {
    journal: Arc<Journal>,
    dom: Arc<Dom>,
    faults: Arc<Faults>,
}

#[async_trait]
impl ViewerService for FakeViewer {
    async fn load(
        &self,
        target: &dyn MountTarget,
        options: ViewerLoadOptions,
    ) -> Result<Arc<dyn ViewerInstance>> {
        if take_failure(&self.faults.viewer_failures) {
            self.journal.push("viewer_load_failed");
            return Err(WizardError::sdk("viewer license rejected"));
        }
        self.journal.push(format!("viewer_load:{}", options.document.len()));
        self.dom.fill(target);
        Ok(Arc::new(FakeViewerInstance))
    }

    async fn unload(&self, target: &dyn MountTarget) -> Result<()> {
        let id = target.id().unwrap_or_default();
        self.journal.push(format!("viewer_unload:{id}"));
        Ok(())
    }
}

pub struct FakeCodeEditor {
    value: Mutex<String>,
    journal: Arc<Journal>,
}

impl CodeEditor for FakeCodeEditor {
    fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }

    fn set_value(&self, text: &str) {
        *self.value.lock().unwrap() = text.to_string();
    }

    fn to_text_area(&self) {
        self.journal.push("code_editor_detached");
    }
}

pub struct FakeCodeEditorFactory {
    journal: Arc<Journal>,
    dom: Arc<Dom>,
    pub last: Mutex<Option<Arc<FakeCodeEditor>>>,
}

impl CodeEditorFactory for FakeCodeEditorFactory {
    fn from_text_area(
        &self,
        target: &dyn MountTarget,
        text: &str,
        _options: &CodeEditorOptions,
    ) -> Result<Arc<dyn CodeEditor>> {
        self.journal.push("code_editor_created");
        self.dom.fill(target);
        let editor = Arc::new(FakeCodeEditor {
            value: Mutex::new(text.to_string()),
            journal: self.journal.clone(),
        });
        *self.last.lock().unwrap() = Some(editor.clone());
        Ok(editor)
    }
}

/// A wizard wired to fakes, with a ready mount target per step
pub struct Harness {
    pub wizard: Wizard,
    pub journal: Arc<Journal>,
    pub faults: Arc<Faults>,
    pub code_editors: Arc<FakeCodeEditorFactory>,
    pub targets: HashMap<StepId, Arc<FakeTarget>>,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Arc::new(Journal::default());
        let dom = Arc::new(Dom::default());
        let faults = Arc::new(Faults::default());
        let code_editors = Arc::new(FakeCodeEditorFactory {
            journal: journal.clone(),
            dom: dom.clone(),
            last: Mutex::new(None),
        });
        let services = Services {
            authoring: Arc::new(FakeAuthoring {
                journal: journal.clone(),
                dom: dom.clone(),
                faults: faults.clone(),
            }),
            merge: Arc::new(FakeMerge {
                journal: journal.clone(),
            }),
            viewer: Arc::new(FakeViewer {
                journal: journal.clone(),
                dom: dom.clone(),
                faults: faults.clone(),
            }),
            code_editor: code_editors.clone(),
            catalog: Arc::new(BundledCatalog),
        };
        let wizard = Wizard::new(services, LifecycleOptions::default());

        let mut targets = HashMap::new();
        for step in StepId::ALL.into_iter().skip(1) {
            let target = FakeTarget::ready(step.slug());
            dom.register(&target);
            wizard.attach(step, Some(target.clone() as Arc<dyn MountTarget>));
            targets.insert(step, target);
        }

        Self {
            wizard,
            journal,
            faults,
            code_editors,
            targets,
        }
    }

    pub fn target(&self, step: StepId) -> &Arc<FakeTarget> {
        &self.targets[&step]
    }

    pub fn last_code_editor(&self) -> Arc<FakeCodeEditor> {
        self.code_editors.last.lock().unwrap().clone().unwrap()
    }

    pub fn index(&self) -> usize {
        self.wizard.store().read(|s| s.current_step_index)
    }

    /// Walk all the way to a live PDF viewer
    pub async fn advance_to_pdf(&self) {
        self.advance_to_data().await;
        assert!(self.wizard.next().await);
        assert_eq!(self.wizard.activate().await, InitOutcome::Created);
        assert!(self.wizard.next().await);
        assert_eq!(self.wizard.activate().await, InitOutcome::Created);
    }

    /// Walk from template selection up to the data step
    pub async fn advance_to_data(&self) {
        self.wizard.select_template(TemplateId::Invoice).await;
        assert!(self.wizard.next().await);
        assert_eq!(self.wizard.activate().await, InitOutcome::Created);
        assert!(self.wizard.next().await);
        assert_eq!(self.wizard.activate().await, InitOutcome::Created);
    }
}
