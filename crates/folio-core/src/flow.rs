// Folio Core - Flow definitions
//
// A Flow binds one input shape, one output shape, a prompt source and a model
// id into a single named operation. Flows keep no state between runs; the
// only things they share are the immutable definition and the model handle.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{FlowError, FlowResult, TemplateError};
use crate::model::{self, Model, ResponseMode};
use crate::schema::{Shape, ValidatedValue};
use crate::template::Template;

/// Where a flow's model prompt comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    /// Render a template against the validated input
    Template(Template),
    /// Send the validated input as-is
    Direct,
}

/// Static declaration of a flow
///
/// Example:
/// ```rust
/// use folio_core::flow::FlowDefinition;
/// use folio_core::schema::{Field, Shape};
///
/// let def = FlowDefinition::new(
///     "explainCode",
///     "googleai/gemini-1.5-flash-latest",
///     Shape::new("ExplainCodeInput").field(Field::string("codeSnippet").min_length(10)),
///     Shape::new("ExplainCodeOutput").field(Field::string("explanation")),
/// )
/// .with_template("Explain:\n{{{codeSnippet}}}")
/// .unwrap();
/// assert_eq!(def.name, "explainCode");
/// ```
#[derive(Debug, Clone)]
pub struct FlowDefinition {
    /// Unique flow name
    pub name: String,

    pub description: Option<String>,

    pub input: Shape,

    pub output: Shape,

    pub prompt: PromptSource,

    /// Provider-qualified model id
    pub model: String,

    pub mode: ResponseMode,

    /// Provider generation config merged into each request
    pub config: Map<String, Value>,
}

impl FlowDefinition {
    /// Direct, structured flow; use the builder methods to change either
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        input: Shape,
        output: Shape,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            input,
            output,
            prompt: PromptSource::Direct,
            model: model.into(),
            mode: ResponseMode::Structured,
            config: Map::new(),
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Parse and attach a prompt template
    pub fn with_template(mut self, source: &str) -> Result<Self, TemplateError> {
        self.prompt = PromptSource::Template(Template::parse(source)?);
        Ok(self)
    }

    pub fn with_mode(mut self, mode: ResponseMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_config(mut self, key: impl Into<String>, value: Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn template(&self) -> Option<&Template> {
        match &self.prompt {
            PromptSource::Template(t) => Some(t),
            PromptSource::Direct => None,
        }
    }

    /// Definition-time checks: every template field must be an input field
    pub fn check(&self) -> FlowResult<()> {
        if let Some(template) = self.template() {
            if let Some(missing) = template
                .referenced_fields()
                .into_iter()
                .find(|f| !self.input.has_field(f))
            {
                return Err(TemplateError::UnresolvedPlaceholder(missing.to_string()).into());
            }
        }
        Ok(())
    }

    /// Validate input and produce the prompt text, without calling a model
    pub fn render_prompt(&self, raw_input: &Value) -> FlowResult<String> {
        let input = self.input.validate(raw_input).map_err(FlowError::InvalidInput)?;
        self.prompt_for(&input)
    }

    fn prompt_for(&self, input: &ValidatedValue) -> FlowResult<String> {
        match &self.prompt {
            PromptSource::Template(template) => Ok(template.render(input.as_map())?),
            PromptSource::Direct => Ok(direct_prompt(&self.input, input)),
        }
    }
}

/// A callable flow, created by `FlowRegistry::define`
pub struct Flow {
    definition: FlowDefinition,
    model: Arc<dyn Model>,
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.definition.name)
            .field("model", &self.definition.model)
            .field("provider", &self.model.name())
            .finish()
    }
}

impl Flow {
    pub(crate) fn new(definition: FlowDefinition, model: Arc<dyn Model>) -> FlowResult<Self> {
        definition.check()?;
        Ok(Self { definition, model })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &FlowDefinition {
        &self.definition
    }

    pub fn render_prompt(&self, raw_input: &Value) -> FlowResult<String> {
        self.definition.render_prompt(raw_input)
    }

    /// Run the flow once: validate, render, one model round trip, validate.
    pub async fn run(&self, raw_input: &Value) -> FlowResult<ValidatedValue> {
        let def = &self.definition;
        debug!("Running flow {}", def.name);

        let input = def.input.validate(raw_input).map_err(|e| {
            debug!("Flow {} rejected input: {}", def.name, e);
            FlowError::InvalidInput(e)
        })?;
        let prompt = def.prompt_for(&input)?;

        let output = model::invoke(
            self.model.as_ref(),
            &def.model,
            prompt,
            &def.output,
            &def.mode,
            &def.config,
        )
        .await
        .map_err(|e| {
            warn!("Flow {} model call failed: {}", def.name, e);
            FlowError::Model(e)
        })?;

        match output {
            Some(output) => {
                info!("Flow {} completed", def.name);
                Ok(output)
            }
            None => {
                warn!("Flow {} produced no output", def.name);
                Err(FlowError::EmptyModelOutput(def.name.clone()))
            }
        }
    }
}

/// A single-string-field input is sent as its text; anything else as JSON
fn direct_prompt(shape: &Shape, input: &ValidatedValue) -> String {
    if let [only] = shape.fields.as_slice() {
        if let Some(text) = input.get_str(&only.name) {
            return text.to_string();
        }
    }
    Value::Object(input.as_map().clone()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, SchemaError};
    use crate::model::{MediaPart, ModelOutput};
    use crate::schema::Field;
    use crate::testing::StubModel;
    use serde_json::json;

    fn tech_definition() -> FlowDefinition {
        FlowDefinition::new(
            "explainTechStack",
            "googleai/test",
            Shape::new("In")
                .field(Field::string("technologyName"))
                .field(Field::string("projectContext").optional()),
            Shape::new("Out").field(Field::string("explanation")),
        )
        .with_template("Explain {{{technologyName}}}{{#if projectContext}} for {{{projectContext}}}{{/if}}.")
        .unwrap()
    }

    fn flow(def: FlowDefinition, model: Arc<StubModel>) -> Flow {
        Flow::new(def, model).unwrap()
    }

    #[tokio::test]
    async fn test_run_returns_validated_output() {
        let model = Arc::new(StubModel::json(json!({"explanation": "Firebase is a backend platform."})));
        let flow = flow(tech_definition(), model.clone());

        let out = flow.run(&json!({"technologyName": "Firebase"})).await.unwrap();
        assert_eq!(out.into_value(), json!({"explanation": "Firebase is a backend platform."}));
        assert_eq!(model.requests()[0].prompt, "Explain Firebase.");
        assert_eq!(model.requests()[0].model_id, "googleai/test");
    }

    #[tokio::test]
    async fn test_invalid_input_skips_model() {
        let model = Arc::new(StubModel::json(json!({"explanation": "x"})));
        let flow = flow(tech_definition(), model.clone());

        let err = flow.run(&json!({"projectContext": "blog"})).await.unwrap_err();
        assert!(matches!(
            err,
            FlowError::InvalidInput(SchemaError::MissingField(ref f)) if f == "technologyName"
        ));
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_output() {
        let model = Arc::new(StubModel::returning(ModelOutput::Empty));
        let flow = flow(tech_definition(), model);

        let err = flow.run(&json!({"technologyName": "Rust"})).await.unwrap_err();
        assert!(matches!(err, FlowError::EmptyModelOutput(ref n) if n == "explainTechStack"));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_partial_output_is_rejected() {
        let model = Arc::new(StubModel::json(json!({"notes": "partial"})));
        let flow = flow(tech_definition(), model);

        let err = flow.run(&json!({"technologyName": "Rust"})).await.unwrap_err();
        assert!(matches!(err, FlowError::Model(ModelError::OutputValidation(_))));
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let model = Arc::new(StubModel::failing("connection reset"));
        let flow = flow(tech_definition(), model.clone());

        let err = flow.run(&json!({"technologyName": "Rust"})).await.unwrap_err();
        assert!(matches!(err, FlowError::Model(ModelError::Transport(_))));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_direct_media_flow() {
        let model = Arc::new(StubModel::returning(ModelOutput::Media(MediaPart::new(
            "audio/wav",
            b"RIFF".to_vec(),
        ))));
        let def = FlowDefinition::new(
            "textToSpeech",
            "googleai/tts",
            Shape::new("In").field(Field::string("text")),
            Shape::new("Out").field(Field::string("audioDataUri")),
        )
        .with_mode(ResponseMode::MediaDataUri {
            field: "audioDataUri".into(),
        });
        let flow = flow(def, model.clone());

        let out = flow.run(&json!({"text": "Hello there"})).await.unwrap();
        assert_eq!(out.get_str("audioDataUri"), Some("data:audio/wav;base64,UklGRg=="));
        assert_eq!(model.requests()[0].prompt, "Hello there");
    }

    #[test]
    fn test_direct_prompt_multi_field_is_json() {
        let shape = Shape::new("In")
            .field(Field::string("a"))
            .field(Field::string("b"));
        let input = shape.validate(&json!({"a": "1", "b": "2"})).unwrap();
        let prompt = direct_prompt(&shape, &input);
        assert_eq!(serde_json::from_str::<Value>(&prompt).unwrap(), json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_template_field_must_be_declared() {
        let def = FlowDefinition::new(
            "bad",
            "googleai/test",
            Shape::new("In").field(Field::string("codeSnippet")),
            Shape::new("Out").field(Field::string("explanation")),
        )
        .with_template("{{{code}}}")
        .unwrap();

        let err = Flow::new(def, Arc::new(StubModel::json(json!({})))).unwrap_err();
        assert!(matches!(
            err,
            FlowError::Template(TemplateError::UnresolvedPlaceholder(ref f)) if f == "code"
        ));
    }

    #[test]
    fn test_render_prompt_without_model_call() {
        let model = Arc::new(StubModel::json(json!({})));
        let flow = flow(tech_definition(), model.clone());
        let prompt = flow
            .render_prompt(&json!({"technologyName": "Rust", "projectContext": "a CLI"}))
            .unwrap();
        assert_eq!(prompt, "Explain Rust for a CLI.");
        assert_eq!(model.call_count(), 0);
    }
}
