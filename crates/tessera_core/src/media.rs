//! Media source types for multimodal content.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Where media content is sourced from.
///
/// # Examples
///
/// ```
/// use tessera_core::MediaSource;
///
/// let url = MediaSource::Url("https://example.com/image.png".to_string());
/// let binary = MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]);
/// assert!(url.as_url().is_some());
/// assert!(binary.as_url().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaSource {
    /// URL to fetch the content from
    Url(String),
    /// Base64-encoded content
    Base64(String),
    /// Raw binary data
    Binary(Vec<u8>),
}

impl MediaSource {
    /// The URL, if this source is a remote reference.
    pub fn as_url(&self) -> Option<&str> {
        match self {
            MediaSource::Url(url) => Some(url),
            _ => None,
        }
    }

    /// Decoded bytes for inline sources; `None` for URLs or undecodable base64.
    pub fn bytes(&self) -> Option<Vec<u8>> {
        match self {
            MediaSource::Url(_) => None,
            MediaSource::Base64(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .ok(),
            MediaSource::Binary(data) => Some(data.clone()),
        }
    }

    /// Render as a URI: the URL itself or a `data:` URI for inline content.
    pub fn to_uri(&self, mime: &str) -> String {
        match self {
            MediaSource::Url(url) => url.clone(),
            MediaSource::Base64(encoded) => format!("data:{};base64,{}", mime, encoded),
            MediaSource::Binary(data) => format!(
                "data:{};base64,{}",
                mime,
                base64::engine::general_purpose::STANDARD.encode(data)
            ),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URI or fall back to a plain URL.
    ///
    /// Returns the source and the MIME type when one was embedded.
    pub fn from_uri(uri: &str) -> (Self, Option<String>) {
        let parsed = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .filter(|(header, _)| header.ends_with(";base64"));

        match parsed {
            Some((header, payload)) => {
                let mime = header.split(';').next().filter(|m| !m.is_empty());
                (
                    MediaSource::Base64(payload.to_string()),
                    mime.map(str::to_string),
                )
            }
            None => (MediaSource::Url(uri.to_string()), None),
        }
    }
}
