//! Model seam and the invocation step
//!
//! `Model` is implemented by hosted providers (see `folio-llm`) and by test
//! doubles. `invoke` wraps one provider round trip with the output-shape gate:
//! callers only ever see a conforming record, `None` for a vacuous response,
//! or a `ModelError`.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::schema::{Shape, ValidatedValue};

/// Kind of content requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Audio,
}

/// How a flow turns the provider response into its output record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode")]
pub enum ResponseMode {
    /// Schema-guided JSON generation, validated against the output shape
    Structured,
    /// Binary media re-expressed as a data URI in the named output field
    MediaDataUri { field: String },
}

impl ResponseMode {
    pub fn modality(&self) -> Modality {
        match self {
            ResponseMode::Structured => Modality::Text,
            ResponseMode::MediaDataUri { .. } => Modality::Audio,
        }
    }
}

/// One request to a hosted model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// Provider-qualified model id, e.g. `googleai/gemini-1.5-flash-latest`
    pub model_id: String,

    /// Rendered prompt text
    pub prompt: String,

    /// JSON Schema the response must follow (structured requests only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,

    pub modality: Modality,

    /// Provider-specific generation config
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
}

/// Raw provider output, before shape validation
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Json(Value),
    Media(MediaPart),
    Empty,
}

/// Opaque binary media returned by a provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl MediaPart {
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// `data:<mime>;base64,<payload>`
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

/// A hosted generative model
#[async_trait]
pub trait Model: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Perform exactly one round trip; no retries, no caching
    async fn generate(&self, request: ModelRequest) -> ModelResult<ModelOutput>;
}

/// Call the model once and gate the result through `output_shape`.
///
/// Returns `Ok(None)` when the provider answered without a usable payload.
pub async fn invoke(
    model: &dyn Model,
    model_id: &str,
    prompt: String,
    output_shape: &Shape,
    mode: &ResponseMode,
    config: &Map<String, Value>,
) -> ModelResult<Option<ValidatedValue>> {
    let request = ModelRequest {
        model_id: model_id.to_string(),
        prompt,
        response_schema: match mode {
            ResponseMode::Structured => Some(output_shape.to_json_schema()),
            ResponseMode::MediaDataUri { .. } => None,
        },
        modality: mode.modality(),
        config: config.clone(),
    };

    debug!(
        "Invoking {} on {} ({} prompt chars)",
        model_id,
        model.name(),
        request.prompt.chars().count()
    );

    let candidate = match (model.generate(request).await?, mode) {
        (ModelOutput::Empty, _) | (ModelOutput::Json(Value::Null), _) => return Ok(None),
        (ModelOutput::Json(value), ResponseMode::Structured) => value,
        (ModelOutput::Media(media), ResponseMode::MediaDataUri { field }) => {
            if media.data.is_empty() {
                return Ok(None);
            }
            let mut record = Map::new();
            record.insert(field.clone(), Value::String(media.to_data_uri()));
            Value::Object(record)
        }
        (ModelOutput::Media(media), ResponseMode::Structured) => {
            return Err(ModelError::malformed(format!(
                "expected a JSON record, got {} media",
                media.mime_type
            )))
        }
        (ModelOutput::Json(_), ResponseMode::MediaDataUri { .. }) => {
            return Err(ModelError::malformed("expected media, got a JSON record"))
        }
    };

    output_shape
        .validate(&candidate)
        .map(Some)
        .map_err(ModelError::OutputValidation)
}
