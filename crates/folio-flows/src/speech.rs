//! Text-to-speech narration
//!
//! A direct flow: the text goes to the speech model untouched and the audio
//! comes back as a data URI.

use folio_core::{Field, FlowDefinition, FlowRegistry, FlowResult, ResponseMode, Shape};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::run_checked;

pub const NAME: &str = "textToSpeech";

pub const TTS_MODEL: &str = "googleai/gemini-2.5-flash-preview-tts";

pub const VOICE: &str = "Algenib";

#[derive(Debug, Clone, PartialEq, Serialize)]
struct TextToSpeechInput<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextToSpeechOutput {
    /// `data:<mime>;base64,<audio>`
    pub audio_data_uri: String,
}

/// Shape checked at the form boundary
pub fn form_shape() -> Shape {
    Shape::new("TextToSpeechInput")
        .field(Field::string("text").describe("The text to narrate.").min_length(1))
}

pub fn input_shape() -> Shape {
    form_shape().without_constraints()
}

pub fn output_shape() -> Shape {
    Shape::new("TextToSpeechOutput")
        .field(Field::string("audioDataUri").describe("The narrated audio as a data URI."))
}

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(NAME, TTS_MODEL, input_shape(), output_shape())
        .with_description("Narrate text as speech audio")
        .with_mode(ResponseMode::MediaDataUri {
            field: "audioDataUri".to_string(),
        })
        .with_config(
            "speechConfig",
            json!({"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": VOICE}}}),
        )
}

pub async fn text_to_speech(registry: &FlowRegistry, text: &str) -> FlowResult<TextToSpeechOutput> {
    run_checked(registry, NAME, &TextToSpeechInput { text }).await
}
