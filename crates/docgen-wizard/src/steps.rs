/// Wizard steps in the order the user walks through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    SelectTemplate,
    EditTemplate,
    FillData,
    GenerateDocx,
    GeneratePdf,
}

impl StepId {
    pub const ALL: [StepId; 5] = [
        StepId::SelectTemplate,
        StepId::EditTemplate,
        StepId::FillData,
        StepId::GenerateDocx,
        StepId::GeneratePdf,
    ];

    pub fn index(self) -> usize {
        match self {
            StepId::SelectTemplate => 0,
            StepId::EditTemplate => 1,
            StepId::FillData => 2,
            StepId::GenerateDocx => 3,
            StepId::GeneratePdf => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<StepId> {
        StepId::ALL.get(index).copied()
    }

    pub fn slug(self) -> &'static str {
        match self {
            StepId::SelectTemplate => "select-template",
            StepId::EditTemplate => "edit-template",
            StepId::FillData => "fill-data",
            StepId::GenerateDocx => "generate-docx",
            StepId::GeneratePdf => "generate-pdf",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StepDescriptor {
    pub id: StepId,
    pub title: &'static str,
    pub mobile_title: &'static str,
    pub description: &'static str,
    pub is_complete: bool,
    pub is_active: bool,
}

impl StepDescriptor {
    fn new(
        id: StepId,
        title: &'static str,
        mobile_title: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            id,
            title,
            mobile_title,
            description,
            is_complete: false,
            is_active: id.index() == 0,
        }
    }
}

/// The fixed step registry. Only the first step starts active.
pub fn default_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor::new(
            StepId::SelectTemplate,
            "Select a template",
            "Template",
            "Pick one of the demo templates or upload your own DOCX.",
        ),
        StepDescriptor::new(
            StepId::EditTemplate,
            "Edit the template",
            "Edit",
            "Adjust the layout and merge fields of the chosen template.",
        ),
        StepDescriptor::new(
            StepId::FillData,
            "Provide the data",
            "Data",
            "Edit the JSON model whose values replace the merge fields.",
        ),
        StepDescriptor::new(
            StepId::GenerateDocx,
            "Generate the DOCX",
            "DOCX",
            "Review the merged document before exporting it.",
        ),
        StepDescriptor::new(
            StepId::GeneratePdf,
            "Generate the PDF",
            "PDF",
            "View, download or sign the final PDF.",
        ),
    ]
}
