//! Chat-completions wire types.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize, derive_builder::Builder)]
#[builder(setter(into, strip_option))]
pub struct ChatRequest {
    /// Model identifier
    pub model: String,
    /// Conversation
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Reasoning effort hint ("low", "medium", "high")
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<String>,
    /// Structured output format
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    /// Creates a new request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::default()
    }
}

/// One conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Plain text or a list of typed parts
    pub content: ChatContent,
}

/// Message content: a bare string for single text turns, typed parts otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChatContent {
    /// Text only
    Text(String),
    /// Multimodal parts
    Parts(Vec<ChatPart>),
}

/// Typed content part.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatPart {
    /// Text fragment
    Text {
        /// Text
        text: String,
    },
    /// Image by URL or `data:` URI
    ImageUrl {
        /// Image reference
        image_url: ImageUrl,
    },
    /// Inline base64 audio
    InputAudio {
        /// Audio payload
        input_audio: InputAudio,
    },
}

/// Image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// URL or `data:` URI
    pub url: String,
}

/// Inline audio input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputAudio {
    /// Base64 payload
    pub data: String,
    /// Container format, e.g. "wav"
    pub format: String,
}

/// `response_format` for structured output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseFormat {
    /// Always "json_schema"
    #[serde(rename = "type")]
    pub kind: String,
    /// Schema definition
    pub json_schema: JsonSchemaFormat,
}

/// Named JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonSchemaFormat {
    /// Schema name
    pub name: String,
    /// The schema itself
    pub schema: JsonValue,
    /// Whether the provider must enforce the schema strictly
    pub strict: bool,
}

impl ResponseFormat {
    /// JSON schema response format.
    pub fn json_schema(schema: &JsonValue) -> Self {
        Self {
            kind: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: "response".to_string(),
                schema: schema.clone(),
                strict: false,
            },
        }
    }
}

/// Chat-completions response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Alternatives; only the first is used
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One response alternative.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// Generated message
    pub message: ResponseMessage,
}

/// Generated message.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
    /// Generated images (image-capable models)
    #[serde(default)]
    pub images: Vec<ResponseImage>,
    /// Generated audio (audio-capable models)
    #[serde(default)]
    pub audio: Option<ResponseAudio>,
}

/// Generated image.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseImage {
    /// Image reference
    pub image_url: ImageUrl,
}

/// Generated audio.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseAudio {
    /// Base64 payload
    pub data: String,
    /// Container format, when reported
    #[serde(default)]
    pub format: Option<String>,
}
