//! Project documentation generator

use folio_core::{Field, FlowDefinition, FlowRegistry, FlowResult, Shape, TemplateError};
use serde::{Deserialize, Serialize};

use crate::{run_typed, TEXT_MODEL};

pub const NAME: &str = "generateProjectDocumentation";

const PROMPT: &str = r#"You are an AI documentation generator. Generate documentation for the following AI-powered project.
The documentation should be formatted in markdown and clearly explain the project's purpose, tech stack, key features, and potential implementation details.

Project Name: {{{projectName}}}
Project Description: {{{projectDescription}}}
Tech Stack: {{{techStack}}}
Key Features: {{{keyFeatures}}}

Please generate the documentation in markdown format. For the "Tech Stack" and "Key Features" sections, format the provided strings into proper markdown bulleted lists.

Example Markdown Structure:
# Project: {{{projectName}}}

## Overview
{{{projectDescription}}}

## Tech Stack
- [First technology]
- [Second technology]
- ...

## Key Features
- [First feature]
- [Second feature]
- ...

## Potential Implementation Notes
(Provide a brief, high-level suggestion on implementation if appropriate, based on the description and features.)

Output the entire response as a single markdown string for the 'documentation' field.
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateProjectDocumentationInput {
    pub project_name: String,
    pub project_description: String,
    /// Comma-separated, e.g. "Gemini, Firebase, Next.js"
    pub tech_stack: String,
    /// Newline-separated feature list
    pub key_features: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateProjectDocumentationOutput {
    /// Markdown document
    pub documentation: String,
}

/// Shape checked at the form boundary, with minimum lengths
pub fn form_shape() -> Shape {
    Shape::new("GenerateProjectDocumentationInput")
        .field(
            Field::string("projectName")
                .describe("The name of the AI-powered project.")
                .min_length(3),
        )
        .field(
            Field::string("projectDescription")
                .describe("A detailed description of the project.")
                .min_length(10),
        )
        .field(
            Field::string("techStack")
                .describe("A comma-separated string of the tech stack used in the project (e.g., Gemini, Firebase, Next.js).")
                .min_length(3),
        )
        .field(
            Field::string("keyFeatures")
                .describe("The key features of the project, can be newline-separated.")
                .min_length(10),
        )
}

pub fn input_shape() -> Shape {
    form_shape().without_constraints()
}

pub fn output_shape() -> Shape {
    Shape::new("GenerateProjectDocumentationOutput").field(
        Field::string("documentation")
            .describe("The generated documentation for the AI-powered project, formatted in markdown."),
    )
}

pub fn definition() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(NAME, TEXT_MODEL, input_shape(), output_shape())
        .with_description("Generate markdown documentation for an AI-powered project")
        .with_template(PROMPT)
}

/// Runs against the flow shape only; callers at the form boundary use
/// [`crate::forms::submit`] to get the minimum-length rules
pub async fn generate_project_documentation(
    registry: &FlowRegistry,
    input: &GenerateProjectDocumentationInput,
) -> FlowResult<GenerateProjectDocumentationOutput> {
    run_typed(registry, NAME, input).await
}
