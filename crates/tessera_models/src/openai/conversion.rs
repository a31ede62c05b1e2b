//! Conversions between Tessera messages and chat-completions wire types.

use super::dto::{
    ChatContent, ChatMessage, ChatPart, ChatResponse, ImageUrl, InputAudio, ResponseMessage,
};
use base64::Engine as _;
use tessera_core::{AudioPayload, ContentPart, MediaSource, Message, RawResponse, Role};
use tessera_error::{ModelError, ModelErrorKind, TesseraResult};

const DEFAULT_IMAGE_MIME: &str = "image/png";
const DEFAULT_AUDIO_FORMAT: &str = "wav";

/// Convert a conversation turn.
///
/// A turn made of a single text fragment is sent as a plain string, which every
/// compatible provider accepts; anything else becomes typed parts.
pub fn to_chat_message(message: &Message) -> ChatMessage {
    let content = match message.content.as_slice() {
        [ContentPart::Text(text)] => ChatContent::Text(text.clone()),
        parts => ChatContent::Parts(parts.iter().map(to_chat_part).collect()),
    };
    ChatMessage {
        role: role_name(message.role).to_string(),
        content,
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

fn to_chat_part(part: &ContentPart) -> ChatPart {
    match part {
        ContentPart::Text(text) => ChatPart::Text { text: text.clone() },
        ContentPart::Image { mime, source } => ChatPart::ImageUrl {
            image_url: ImageUrl {
                url: source.to_uri(mime.as_deref().unwrap_or(DEFAULT_IMAGE_MIME)),
            },
        },
        ContentPart::Audio { mime, source } => {
            let format = mime
                .as_deref()
                .and_then(|m| m.strip_prefix("audio/"))
                .unwrap_or(DEFAULT_AUDIO_FORMAT)
                .to_string();
            match source {
                MediaSource::Base64(data) => ChatPart::InputAudio {
                    input_audio: InputAudio {
                        data: data.clone(),
                        format,
                    },
                },
                MediaSource::Binary(bytes) => ChatPart::InputAudio {
                    input_audio: InputAudio {
                        data: base64::engine::general_purpose::STANDARD.encode(bytes),
                        format,
                    },
                },
                // Audio input must be inline; remote audio is passed as a reference
                MediaSource::Url(url) => ChatPart::Text {
                    text: format!("Audio: {}", url),
                },
            }
        }
    }
}

/// The first choice's message.
///
/// # Errors
///
/// Returns [`ModelErrorKind::EmptyResponse`] if the response has no choices.
pub fn first_message(response: ChatResponse) -> TesseraResult<ResponseMessage> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ModelError::new(ModelErrorKind::EmptyResponse).into())
}

/// Map a generated message onto a raw response.
pub fn to_raw_response(message: ResponseMessage) -> RawResponse {
    RawResponse {
        content: message.content.filter(|text| !text.is_empty()),
        image_refs: message
            .images
            .into_iter()
            .map(|image| image.image_url.url)
            .collect(),
        audio: message.audio.map(|audio| AudioPayload {
            data: audio.data,
            format: audio.format,
        }),
    }
}
