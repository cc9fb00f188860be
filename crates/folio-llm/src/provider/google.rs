//! Google Generative Language API provider
//!
//! Model ids take the form `googleai/<model>`. Structured requests use
//! schema-guided JSON generation; audio requests ask for the `AUDIO` response
//! modality and return the first inline media part.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use folio_core::{
    MediaPart, Modality, Model, ModelError, ModelOutput, ModelRequest, ModelResult,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::{redact, ModelConfig};

/// Google (Gemini) provider
#[derive(Clone)]
pub struct GoogleProvider {
    config: ModelConfig,
    client: Client,
    api_key: String,
}

impl fmt::Debug for GoogleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleProvider")
            .field("endpoint", &self.config.endpoint())
            .field("config", &self.config)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Schema keywords the API accepts in `responseSchema`
const SCHEMA_KEYS: [&str; 7] = [
    "type",
    "description",
    "enum",
    "properties",
    "required",
    "items",
    "nullable",
];

impl GoogleProvider {
    pub const MODEL_PREFIX: &'static str = "googleai/";

    /// Create a provider; fails when no API key is configured or exported
    pub fn create(config: ModelConfig) -> ModelResult<Self> {
        let config = config.with_env_api_key();
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                ModelError::config(
                    "no API key: set GEMINI_API_KEY or GOOGLE_API_KEY in the environment",
                )
            })?;

        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ModelError::config(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ModelError::config(format!("invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ModelError::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            api_key,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Strip the provider prefix from a model id
    pub fn model_name(model_id: &str) -> ModelResult<&str> {
        model_id
            .strip_prefix(Self::MODEL_PREFIX)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ModelError::UnsupportedModel(model_id.to_string()))
    }

    /// `generateContent` URL for a model id
    pub fn url_for(&self, model_id: &str) -> ModelResult<String> {
        Ok(format!(
            "{}/models/{}:generateContent",
            self.config.endpoint(),
            Self::model_name(model_id)?
        ))
    }

    /// JSON request body for a model request
    pub fn build_request_body(&self, request: &ModelRequest) -> Value {
        let mut generation = Map::new();
        if let Some(temperature) = self.config.temperature {
            generation.insert("temperature".into(), json!(temperature));
        }
        if let Some(max_tokens) = self.config.max_tokens {
            generation.insert("maxOutputTokens".into(), json!(max_tokens));
        }

        match request.modality {
            Modality::Text => {
                if let Some(schema) = &request.response_schema {
                    generation.insert("responseMimeType".into(), json!("application/json"));
                    generation.insert("responseSchema".into(), to_response_schema(schema));
                }
            }
            Modality::Audio => {
                generation.insert("responseModalities".into(), json!(["AUDIO"]));
            }
        }

        for (key, value) in &request.config {
            generation.insert(key.clone(), value.clone());
        }

        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }],
            "generationConfig": generation,
        })
    }

    /// Turn a successful response body into a model output
    pub fn parse_response(body: &str, modality: Modality) -> ModelResult<ModelOutput> {
        let response: GenerateContentResponse = serde_json::from_str(body)
            .map_err(|e| ModelError::malformed(format!("invalid response body: {}", e)))?;

        let candidate = match response.candidates.into_iter().next() {
            Some(candidate) => candidate,
            None => {
                return match response.prompt_feedback.and_then(|f| f.block_reason) {
                    Some(reason) => Err(ModelError::Blocked(reason)),
                    None => Ok(ModelOutput::Empty),
                }
            }
        };

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();
        let output = match modality {
            Modality::Text => parse_text_parts(&parts)?,
            Modality::Audio => parse_media_parts(parts)?,
        };

        if output == ModelOutput::Empty && candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ModelError::Blocked("SAFETY".to_string()));
        }
        Ok(output)
    }
}

fn parse_text_parts(parts: &[Part]) -> ModelResult<ModelOutput> {
    let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
    let text = strip_code_fence(text.trim());
    if text.is_empty() {
        return Ok(ModelOutput::Empty);
    }
    serde_json::from_str(text)
        .map(ModelOutput::Json)
        .map_err(|e| ModelError::malformed(format!("response text is not JSON: {}", e)))
}

fn parse_media_parts(parts: Vec<Part>) -> ModelResult<ModelOutput> {
    let Some(inline) = parts.into_iter().find_map(|p| p.inline_data) else {
        return Ok(ModelOutput::Empty);
    };
    let data = STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| ModelError::malformed(format!("media payload is not base64: {}", e)))?;
    Ok(ModelOutput::Media(MediaPart::new(inline.mime_type, data)))
}

/// Models occasionally wrap JSON in a markdown fence despite the mime type
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Reduce a JSON Schema to the subset the API accepts, with upper-case types
fn to_response_schema(schema: &Value) -> Value {
    let Value::Object(obj) = schema else {
        return schema.clone();
    };

    let mut out = Map::new();
    for (key, value) in obj {
        if !SCHEMA_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = match (key.as_str(), value) {
            ("type", Value::String(t)) => Value::String(t.to_uppercase()),
            ("properties", Value::Object(props)) => Value::Object(
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), to_response_schema(prop)))
                    .collect(),
            ),
            ("items", items) => to_response_schema(items),
            _ => value.clone(),
        };
        out.insert(key.clone(), value);
    }
    Value::Object(out)
}

#[async_trait]
impl Model for GoogleProvider {
    fn name(&self) -> &str {
        "googleai"
    }

    async fn generate(&self, request: ModelRequest) -> ModelResult<ModelOutput> {
        let url = self.url_for(&request.model_id)?;
        let body = self.build_request_body(&request);

        debug!("Sending request to Gemini API: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::transport(format!("request to {} timed out", url))
                } else {
                    ModelError::transport(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ModelError::transport(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            warn!("Gemini API returned {}: {}", status, message);
            return Err(ModelError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        Self::parse_response(&text, request.modality)
    }
}
