use crate::data::{DataPayload, default_payload};
use crate::services::TemplateCatalog;
use crate::types::{Result, TemplateId, WizardError};
use serde_json::{Value, json};

/// Demo templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCatalog;

impl BundledCatalog {
    fn paragraphs(id: TemplateId) -> Option<Vec<&'static str>> {
        match id {
            TemplateId::Invoice => Some(vec![
                "Invoice {{invoiceNumber}}",
                "Date: {{date}}",
                "Bill to: {{customer.name}}, {{customer.address}}",
                "{{#items}}{{description}}: {{quantity}} x {{price}}{{/items}}",
                "Total: {{total}}",
            ]),
            TemplateId::Contract => Some(vec![
                "Service Agreement",
                "This agreement between {{partyA}} and {{partyB}} starts {{effectiveDate}}.",
                "The term of this agreement is {{term}}.",
            ]),
            TemplateId::Letter => Some(vec![
                "Dear {{recipient}},",
                "{{body}}",
                "Regards, {{sender}}",
            ]),
            TemplateId::Custom => None,
        }
    }
}

impl TemplateCatalog for BundledCatalog {
    fn structured_template(&self, id: TemplateId) -> Result<Value> {
        let paragraphs = Self::paragraphs(id).ok_or_else(|| {
            WizardError::UnknownTemplate(format!("{id} has no bundled structure"))
        })?;
        let body: Vec<Value> = paragraphs
            .into_iter()
            .map(|text| json!({ "type": "paragraph", "text": text }))
            .collect();
        Ok(json!({
            "type": "document",
            "name": id.name(),
            "sections": [{ "type": "section", "body": body }]
        }))
    }

    fn default_data(&self, id: TemplateId) -> DataPayload {
        default_payload(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_templates_have_structure() {
        for id in TemplateId::DEMO {
            let template = BundledCatalog.structured_template(id).unwrap();
            assert_eq!(template["name"], id.name());
            assert!(template["sections"][0]["body"].as_array().unwrap().len() > 1);
        }
    }

    #[test]
    fn custom_template_is_not_bundled() {
        let err = BundledCatalog
            .structured_template(TemplateId::Custom)
            .unwrap_err();
        assert!(matches!(err, WizardError::UnknownTemplate(_)));
    }
}
