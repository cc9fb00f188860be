//! Tech-stack explainer, optionally in the context of a project

use folio_core::{Field, FlowDefinition, FlowRegistry, FlowResult, Shape, TemplateError};
use serde::{Deserialize, Serialize};

use crate::{run_checked, TEXT_MODEL};

pub const NAME: &str = "explainTechStack";

const PROMPT: &str = r#"You are a helpful tech explainer. Your goal is to provide concise and easy-to-understand explanations of software technologies.

Technology to explain: {{{technologyName}}}

{{#if projectContext}}
Project Context: {{{projectContext}}}
Explain '{{{technologyName}}}' in 2-3 sentences.
Then, add 1-2 sentences on how '{{{technologyName}}}' is typically used in a project like '{{{projectContext}}}'.
{{else}}
Explain '{{{technologyName}}}' in 2-3 sentences.
{{/if}}

Keep the entire explanation under 5 sentences and suitable for a general audience, including those who may not be deeply technical.
Focus on clarity and brevity. Ensure the output is a single string for the 'explanation' field."#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainTechStackInput {
    pub technology_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,
}

impl ExplainTechStackInput {
    pub fn new(technology_name: impl Into<String>) -> Self {
        Self {
            technology_name: technology_name.into(),
            project_context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.project_context = Some(context.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainTechStackOutput {
    pub explanation: String,
}

pub fn input_shape() -> Shape {
    Shape::new("ExplainTechStackInput")
        .field(Field::string("technologyName").describe("The name of the technology to explain."))
        .field(
            Field::string("projectContext")
                .optional()
                .describe("An optional context of a project where this technology is used."),
        )
}

/// No extra form rules; the flow shape is the form shape
pub fn form_shape() -> Shape {
    input_shape()
}

pub fn output_shape() -> Shape {
    Shape::new("ExplainTechStackOutput")
        .field(Field::string("explanation").describe("The concise explanation of the technology."))
}

pub fn definition() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(NAME, TEXT_MODEL, input_shape(), output_shape())
        .with_description("Explain a technology in a few sentences")
        .with_template(PROMPT)
}

pub async fn explain_tech_stack(
    registry: &FlowRegistry,
    input: &ExplainTechStackInput,
) -> FlowResult<ExplainTechStackOutput> {
    run_checked(registry, NAME, input).await
}
