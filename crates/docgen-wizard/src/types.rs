use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("SDK error: {0}")]
    Sdk(String),
    #[error("Missing upstream artifact: {0}")]
    MissingUpstream(&'static str),
    #[error("Not available on the {0} step")]
    WrongStep(&'static str),
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WizardError {
    pub fn sdk(message: impl Into<String>) -> Self {
        WizardError::Sdk(message.into())
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;

/// Demo templates bundled with the wizard, plus user uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    Invoice,
    Contract,
    Letter,
    /// Uploaded by the user; bytes live in `WizardState::custom_template_binary`
    Custom,
}

impl TemplateId {
    pub const DEMO: [TemplateId; 3] = [
        TemplateId::Invoice,
        TemplateId::Contract,
        TemplateId::Letter,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TemplateId::Invoice => "invoice",
            TemplateId::Contract => "contract",
            TemplateId::Letter => "letter",
            TemplateId::Custom => "custom",
        }
    }
}

impl std::str::FromStr for TemplateId {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "invoice" => Ok(TemplateId::Invoice),
            "contract" => Ok(TemplateId::Contract),
            "letter" => Ok(TemplateId::Letter),
            "custom" => Ok(TemplateId::Custom),
            other => Err(WizardError::UnknownTemplate(other.to_string())),
        }
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Rendered size of a mount target in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetSize {
    pub width: f32,
    pub height: f32,
}

impl TargetSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
