//! Message types for conversation history.

use crate::{ContentPart, Role};
use serde::{Deserialize, Serialize};

/// A multimodal message in a conversation.
///
/// # Examples
///
/// ```
/// use tessera_core::{ContentPart, Message, MessageBuilder, Role};
///
/// let message = MessageBuilder::default()
///     .role(Role::User)
///     .content(vec![ContentPart::Text("Hello!".to_string())])
///     .build()
///     .unwrap();
///
/// assert_eq!(message.role, Role::User);
/// assert_eq!(message.text(), "Hello!");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
pub struct Message {
    /// The role of the message sender
    pub role: Role,
    /// The content of the message (can be multimodal)
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Single-fragment text message.
    pub fn from_text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    /// System turn.
    pub fn system(text: impl Into<String>) -> Self {
        Self::from_text(Role::System, text)
    }

    /// User turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::from_text(Role::User, text)
    }

    /// Assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::from_text(Role::Assistant, text)
    }

    /// Borrowed text fragments in order; non-text fragments are skipped.
    pub fn text_content(&self) -> Vec<&str> {
        self.content.iter().filter_map(ContentPart::as_text).collect()
    }

    /// Text fragments joined with newlines.
    pub fn text(&self) -> String {
        self.text_content().join("\n")
    }
}
