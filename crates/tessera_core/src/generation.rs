//! Generation results.

use crate::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The outcome of one generation strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationResult {
    /// Turn appended to history for later steps
    history_message: Message,
    /// Text, path or URI representing the artifact
    column_value: Option<String>,
    /// Structured payload when the step produced one
    raw: Option<JsonValue>,
}

impl GenerationResult {
    /// Assemble a result.
    pub fn new(history_message: Message, column_value: Option<String>, raw: Option<JsonValue>) -> Self {
        Self {
            history_message,
            column_value,
            raw,
        }
    }

    /// Replace the column value, e.g. after promoting a candidate file.
    pub fn with_column_value(mut self, column_value: Option<String>) -> Self {
        self.column_value = column_value;
        self
    }

    /// Data the flow controller stores for this result: the structured payload if
    /// present, otherwise the column value.
    pub fn data(&self) -> JsonValue {
        match (&self.raw, &self.column_value) {
            (Some(raw), _) => raw.clone(),
            (None, Some(value)) => JsonValue::String(value.clone()),
            (None, None) => JsonValue::Null,
        }
    }
}
