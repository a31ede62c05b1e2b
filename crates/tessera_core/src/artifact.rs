//! Generated artifacts and the raw responses they are inspected from.

use crate::{ContentPart, MediaSource, Message, Role};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_error::{GenerationError, GenerationErrorKind};

/// Audio payload returned by a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPayload {
    /// Base64-encoded audio data
    pub data: String,
    /// Container format, e.g. "wav" or "mp3"
    pub format: Option<String>,
}

/// Unprocessed model response: at most one of the fields is expected to carry the
/// artifact.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawResponse {
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
    /// Image references (URLs or `data:` URIs)
    #[serde(default)]
    pub image_refs: Vec<String>,
    /// Audio payload
    #[serde(default)]
    pub audio: Option<AudioPayload>,
}

impl RawResponse {
    /// Text-only response.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }
}

/// Artifact modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ArtifactKind {
    /// Text or structured text
    Text,
    /// Image
    Image,
    /// Audio
    Audio,
}

/// Bytes or text to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactContent {
    /// UTF-8 text
    Text(String),
    /// Binary payload
    Binary(Vec<u8>),
}

impl ArtifactContent {
    /// Payload as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            ArtifactContent::Text(text) => text.as_bytes(),
            ArtifactContent::Binary(data) => data,
        }
    }
}

/// A generated artifact, tagged by modality.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Text (plain or canonical JSON)
    Text {
        /// Text content
        content: String,
        /// File extension without dot
        extension: String,
    },
    /// Image
    Image {
        /// Image source
        source: MediaSource,
        /// MIME type
        mime: String,
        /// File extension without dot
        extension: String,
    },
    /// Audio
    Audio {
        /// Decoded audio bytes
        data: Vec<u8>,
        /// MIME type
        mime: String,
        /// File extension without dot
        extension: String,
    },
}

impl Artifact {
    /// Text artifact.
    pub fn text(content: impl Into<String>, extension: impl Into<String>) -> Self {
        Artifact::Text {
            content: content.into(),
            extension: extension.into(),
        }
    }

    /// Inspect a raw response, preferring audio, then image, then text.
    ///
    /// # Errors
    ///
    /// Returns an error if no field carries a payload or audio data is not valid base64.
    pub fn from_raw(raw: &RawResponse, text_extension: &str) -> Result<Self, GenerationError> {
        if let Some(audio) = &raw.audio {
            let data = base64::engine::general_purpose::STANDARD
                .decode(&audio.data)
                .map_err(|e| {
                    GenerationError::new(GenerationErrorKind::UnexpectedResponse(format!(
                        "audio payload is not valid base64: {}",
                        e
                    )))
                })?;
            let extension = audio.format.clone().unwrap_or_else(|| "wav".to_string());
            let subtype = match extension.as_str() {
                "mp3" => "mpeg",
                other => other,
            };
            let mime = format!("audio/{}", subtype);
            return Ok(Artifact::Audio {
                data,
                mime,
                extension,
            });
        }

        if let Some(image_ref) = raw.image_refs.first() {
            let (source, mime) = MediaSource::from_uri(image_ref);
            let mime = mime.unwrap_or_else(|| mime_from_path(image_ref));
            let extension = extension_for_mime(&mime);
            return Ok(Artifact::Image {
                source,
                mime,
                extension,
            });
        }

        match &raw.content {
            Some(content) if !content.trim().is_empty() => {
                Ok(Artifact::text(content.clone(), text_extension))
            }
            _ => Err(GenerationError::new(GenerationErrorKind::UnexpectedResponse(
                "response carried no text, image or audio".to_string(),
            ))),
        }
    }

    /// Modality tag.
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Text { .. } => ArtifactKind::Text,
            Artifact::Image { .. } => ArtifactKind::Image,
            Artifact::Audio { .. } => ArtifactKind::Audio,
        }
    }

    /// File extension without dot.
    pub fn extension(&self) -> &str {
        match self {
            Artifact::Text { extension, .. }
            | Artifact::Image { extension, .. }
            | Artifact::Audio { extension, .. } => extension,
        }
    }

    /// Persistable payload. Remote images have none.
    pub fn content(&self) -> Option<ArtifactContent> {
        match self {
            Artifact::Text { content, .. } => Some(ArtifactContent::Text(content.clone())),
            Artifact::Image { source, .. } => source.bytes().map(ArtifactContent::Binary),
            Artifact::Audio { data, .. } => Some(ArtifactContent::Binary(data.clone())),
        }
    }

    /// Value written to the output column: the persisted path if there is one,
    /// otherwise the text, URL or `data:` URI.
    pub fn column_value(&self, persisted: Option<&Path>) -> String {
        if let Some(path) = persisted {
            return path.display().to_string();
        }
        match self {
            Artifact::Text { content, .. } => content.clone(),
            Artifact::Image { source, mime, .. } => source.to_uri(mime),
            Artifact::Audio { data, mime, .. } => {
                MediaSource::Binary(data.clone()).to_uri(mime)
            }
        }
    }

    /// The artifact as a content fragment (for judges and critiques).
    pub fn as_content_part(&self) -> ContentPart {
        match self {
            Artifact::Text { content, .. } => ContentPart::Text(content.clone()),
            Artifact::Image { source, mime, .. } => ContentPart::Image {
                mime: Some(mime.clone()),
                source: source.clone(),
            },
            Artifact::Audio { data, mime, .. } => ContentPart::Audio {
                mime: Some(mime.clone()),
                source: MediaSource::Binary(data.clone()),
            },
        }
    }

    /// Turns that replay this artifact as a prior attempt.
    ///
    /// Assistant turns carry text only, so media is represented by an assistant
    /// placeholder followed by a user turn carrying the payload.
    pub fn attempt_turns(&self) -> Vec<Message> {
        match self {
            Artifact::Text { content, .. } => vec![Message::assistant(content.clone())],
            Artifact::Image { .. } | Artifact::Audio { .. } => {
                let kind = self.kind();
                vec![
                    Message::assistant(format!("[Generated {}]", kind)),
                    Message {
                        role: Role::User,
                        content: vec![
                            ContentPart::Text(format!("This is the {} you generated.", kind)),
                            self.as_content_part(),
                        ],
                    },
                ]
            }
        }
    }
}

fn mime_from_path(reference: &str) -> String {
    let lower = reference.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    if path.ends_with(".jpg") || path.ends_with(".jpeg") {
        "image/jpeg".to_string()
    } else if path.ends_with(".webp") {
        "image/webp".to_string()
    } else if path.ends_with(".gif") {
        "image/gif".to_string()
    } else {
        "image/png".to_string()
    }
}

fn extension_for_mime(mime: &str) -> String {
    match mime {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
    .to_string()
}
