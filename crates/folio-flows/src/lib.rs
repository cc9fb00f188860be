//! Folio Flows - the portfolio site's AI flows
//!
//! Four flows are declared here and registered by [`bootstrap`]:
//!
//! - `generateProjectDocumentation` - markdown docs for a project
//! - `explainTechStack` - a short explanation of one technology
//! - `explainCode` - a markdown walkthrough of a code snippet
//! - `textToSpeech` - narrated audio as a data URI
//!
//! Each flow also has a typed entry point taking a registry reference. The
//! entry points for `explainTechStack`, `explainCode` and `textToSpeech`
//! check the flow's form rules first; `generate_project_documentation` runs
//! against the bare flow shape. [`forms::submit`] runs any flow behind its
//! form shape.

pub mod code;
pub mod documentation;
pub mod forms;
pub mod speech;
pub mod tech_stack;

use std::sync::Arc;

use folio_core::{
    FlowDefinition, FlowError, FlowRegistry, FlowResult, Model, ModelError, SchemaError,
    TemplateError, ValidatedValue,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub use code::{explain_code, ExplainCodeInput, ExplainCodeOutput};
pub use documentation::{
    generate_project_documentation, GenerateProjectDocumentationInput,
    GenerateProjectDocumentationOutput,
};
pub use forms::submit;
pub use speech::{text_to_speech, TextToSpeechOutput};
pub use tech_stack::{explain_tech_stack, ExplainTechStackInput, ExplainTechStackOutput};

/// Model used by the text flows
pub const TEXT_MODEL: &str = "googleai/gemini-1.5-flash-latest";

/// The fixed list of flow declarations
pub fn definitions() -> Result<Vec<FlowDefinition>, TemplateError> {
    Ok(vec![
        documentation::definition()?,
        tech_stack::definition()?,
        code::definition()?,
        speech::definition(),
    ])
}

/// Build the process-wide registry; call once at start-up
pub fn bootstrap(model: Arc<dyn Model>) -> FlowResult<FlowRegistry> {
    let registry = FlowRegistry::from_definitions(model, definitions()?)?;
    info!("Registered {} flows: {}", registry.len(), registry.names().join(", "));
    Ok(registry)
}

/// Run a flow with a typed input and decode its validated output
pub async fn run_typed<I, O>(registry: &FlowRegistry, name: &str, input: &I) -> FlowResult<O>
where
    I: Serialize + ?Sized,
    O: DeserializeOwned,
{
    let flow = registry.lookup(name)?;
    let raw = to_input_value(input)?;
    decode_output(name, flow.run(&raw).await?)
}

/// Like [`run_typed`], with the flow's form rules checked before it runs
pub async fn run_checked<I, O>(registry: &FlowRegistry, name: &str, input: &I) -> FlowResult<O>
where
    I: Serialize + ?Sized,
    O: DeserializeOwned,
{
    let raw = to_input_value(input)?;
    decode_output(name, forms::submit(registry, name, &raw).await?)
}

fn to_input_value<I: Serialize + ?Sized>(input: &I) -> FlowResult<Value> {
    serde_json::to_value(input).map_err(|e| {
        FlowError::InvalidInput(SchemaError::TypeMismatch {
            field: "$".to_string(),
            expected: "object".to_string(),
            actual: e.to_string(),
        })
    })
}

fn decode_output<O: DeserializeOwned>(name: &str, output: ValidatedValue) -> FlowResult<O> {
    serde_json::from_value(output.into_value())
        .map_err(|e| FlowError::Model(ModelError::malformed(format!("{}: {}", name, e))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::testing::StubModel;
    use folio_core::ResponseMode;
    use serde_json::json;

    #[test]
    fn test_definitions_are_consistent() {
        for def in definitions().unwrap() {
            def.check().unwrap();
            assert!(def.model.starts_with("googleai/"), "{}", def.name);
        }
    }

    #[test]
    fn test_bootstrap_registers_all_flows() {
        let registry = bootstrap(Arc::new(StubModel::json(json!({})))).unwrap();
        assert_eq!(
            registry.names(),
            vec![
                "explainCode",
                "explainTechStack",
                "generateProjectDocumentation",
                "textToSpeech"
            ]
        );
    }

    #[test]
    fn test_speech_is_media_flow() {
        let def = speech::definition();
        assert!(def.template().is_none());
        assert_eq!(
            def.mode,
            ResponseMode::MediaDataUri {
                field: "audioDataUri".into()
            }
        );
        assert_eq!(
            def.config["speechConfig"]["voiceConfig"]["prebuiltVoiceConfig"]["voiceName"],
            "Algenib"
        );
    }
}
