//! Plugin output units.

use crate::ContentPart;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The atomic output of a content provider: opaque data plus the fragments it
/// contributes to the next model call.
///
/// # Examples
///
/// ```
/// use tessera_core::Packet;
/// use serde_json::json;
///
/// let packet = Packet::new(json!({"title": "Boulder World"}))
///     .with_text("Search result: Boulder World");
/// assert_eq!(packet.content.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Opaque payload
    pub data: JsonValue,
    /// Fragments for the next model call
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl Packet {
    /// Packet with data and no content.
    pub fn new(data: JsonValue) -> Self {
        Self {
            data,
            content: Vec::new(),
        }
    }

    /// Append a text fragment.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(ContentPart::Text(text.into()));
        self
    }

    /// Append an arbitrary fragment.
    pub fn with_part(mut self, part: ContentPart) -> Self {
        self.content.push(part);
        self
    }
}
