use crate::types::{Result, TemplateId, WizardError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Merge-field delimiters, e.g. `{{name}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delimiter {
    pub start: String,
    pub end: String,
}

impl Default for Delimiter {
    fn default() -> Self {
        Self {
            start: "{{".to_string(),
            end: "}}".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub delimiter: Delimiter,
}

/// Data merged into the template: `{ config: { delimiter }, model }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPayload {
    #[serde(default)]
    pub config: DataConfig,
    pub model: Map<String, Value>,
}

impl DataPayload {
    pub fn new(model: Map<String, Value>) -> Self {
        Self {
            config: DataConfig::default(),
            model,
        }
    }

    /// Parse the text of the data editor.
    ///
    /// Syntax errors and a missing or non-object `model` are both reported;
    /// the message is meant to be shown inline next to the editor.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let Some(object) = value.as_object() else {
            return Err(WizardError::InvalidData(
                "payload must be a JSON object".to_string(),
            ));
        };
        if !object.get("model").is_some_and(Value::is_object) {
            return Err(WizardError::InvalidData(
                "\"model\" must be an object".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Text of the data step and its inline validation message.
///
/// Validation failures stay local to the data step; they never reach
/// `WizardState::error`.
#[derive(Debug, Clone, Default)]
pub struct DataEntry {
    text: String,
    validation_error: Option<String>,
}

impl DataEntry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    pub fn is_valid(&self) -> bool {
        self.validation_error.is_none()
    }

    /// Replace the text and validate it, returning the parsed payload on success
    pub fn edit(&mut self, text: &str) -> Option<DataPayload> {
        self.text = text.to_string();
        match DataPayload::parse(text) {
            Ok(payload) => {
                self.validation_error = None;
                Some(payload)
            }
            Err(WizardError::Json(e)) => {
                self.validation_error = Some(format!("Invalid JSON: {e}"));
                None
            }
            Err(e) => {
                self.validation_error = Some(e.to_string());
                None
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sample model for each demo template
pub fn default_payload(template: TemplateId) -> DataPayload {
    let model = match template {
        TemplateId::Invoice => json!({
            "invoiceNumber": "INV-2024-001",
            "date": "2024-03-01",
            "customer": { "name": "Acme Corp.", "address": "1 Main Street" },
            "items": [
                { "description": "Consulting", "quantity": 10, "price": 120.0 },
                { "description": "Support", "quantity": 1, "price": 300.0 }
            ],
            "total": 1500.0
        }),
        TemplateId::Contract => json!({
            "partyA": "Acme Corp.",
            "partyB": "Jane Doe",
            "effectiveDate": "2024-03-01",
            "term": "12 months"
        }),
        TemplateId::Letter => json!({
            "recipient": "Jane Doe",
            "sender": "John Smith",
            "body": "Thank you for your order."
        }),
        TemplateId::Custom => json!({}),
    };
    match model {
        Value::Object(map) => DataPayload::new(map),
        _ => DataPayload::new(Map::new()),
    }
}
