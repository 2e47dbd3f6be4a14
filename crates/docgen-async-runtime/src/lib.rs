mod worker;

// Re-export types from library crates
pub use docgen_wizard::{InitOutcome, KeyInput, StepId, TemplateId, Wizard};
pub use worker::worker_task;

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum WizardCommand {
    SelectTemplate {
        template: TemplateId,
    },
    SelectCustomTemplate {
        bytes: Vec<u8>,
    },
    /// New text in the data editor
    EditData {
        text: String,
    },
    Next,
    Previous,
    GoTo {
        index: usize,
    },
    Key {
        input: KeyInput,
    },
    /// Initialize the current step (mount target laid out, step entered)
    Activate,
    TryAgain,
    Reset,
    ExportPdf,
    /// Tear down every step and stop the worker
    Shutdown,
}

/// Updates sent from worker to UI
#[derive(Debug, Clone)]
pub enum WizardUpdate {
    StepChanged {
        index: usize,
        step: StepId,
    },
    Initialized {
        step: StepId,
        outcome: InitOutcome,
    },
    DataValid,
    DataInvalid {
        message: String,
    },
    PdfExported {
        bytes: Vec<u8>,
    },
    Error {
        message: String,
    },
    Closed,
}
