//! Code snippet explainer

use folio_core::{Field, FlowDefinition, FlowRegistry, FlowResult, Shape, TemplateError};
use serde::{Deserialize, Serialize};

use crate::{run_checked, TEXT_MODEL};

pub const NAME: &str = "explainCode";

const PROMPT: &str = r#"You are an expert code reviewer and AI assistant. Your task is to explain a given code snippet in a clear, concise, and easy-to-understand manner.

The explanation should be formatted in markdown.
1.  Start with a high-level summary of what the code does.
2.  Provide a line-by-line or block-by-block breakdown of the code's logic.
3.  Use markdown for code blocks and formatting to improve readability.
4.  Be helpful and educational.

Code to explain:
```
{{{codeSnippet}}}
```

Generate the explanation and provide it in the 'explanation' field of the output."#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainCodeInput {
    pub code_snippet: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainCodeOutput {
    /// Markdown explanation
    pub explanation: String,
}

/// Shape checked at the form boundary
pub fn form_shape() -> Shape {
    Shape::new("ExplainCodeInput").field(
        Field::string("codeSnippet")
            .describe("The code snippet to be explained.")
            .min_length(10),
    )
}

pub fn input_shape() -> Shape {
    form_shape().without_constraints()
}

pub fn output_shape() -> Shape {
    Shape::new("ExplainCodeOutput").field(
        Field::string("explanation")
            .describe("The detailed explanation of the code snippet, formatted in markdown."),
    )
}

pub fn definition() -> Result<FlowDefinition, TemplateError> {
    FlowDefinition::new(NAME, TEXT_MODEL, input_shape(), output_shape())
        .with_description("Explain a code snippet in markdown")
        .with_template(PROMPT)
}

pub async fn explain_code(
    registry: &FlowRegistry,
    input: &ExplainCodeInput,
) -> FlowResult<ExplainCodeOutput> {
    run_checked(registry, NAME, input).await
}
