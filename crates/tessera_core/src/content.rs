//! Content fragments that make up a conversation turn.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// One fragment of a multimodal conversation turn.
///
/// Plugins contribute fragments to the next model call; prompts are appended as
/// [`ContentPart::Text`].
///
/// # Examples
///
/// ```
/// use tessera_core::{ContentPart, MediaSource};
///
/// let text = ContentPart::Text("Describe this climbing gym".to_string());
/// let image = ContentPart::Image {
///     mime: Some("image/png".to_string()),
///     source: MediaSource::Url("https://example.com/wall.png".to_string()),
/// };
/// assert_eq!(text.as_text(), Some("Describe this climbing gym"));
/// assert_eq!(image.as_text(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ContentPart {
    /// Plain text.
    Text(String),

    /// Image (PNG, JPEG, WebP, GIF, etc.).
    Image {
        /// MIME type, e.g., "image/png"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },

    /// Audio (MP3, WAV, etc.).
    Audio {
        /// MIME type, e.g., "audio/wav"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },
}

impl ContentPart {
    /// Text payload of a text fragment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for ContentPart {
    fn from(text: &str) -> Self {
        ContentPart::Text(text.to_string())
    }
}

impl From<String> for ContentPart {
    fn from(text: String) -> Self {
        ContentPart::Text(text)
    }
}
