//! `text`: a fixed text fragment for the next model call.

use super::parse_config;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tessera_core::Packet;
use tessera_error::TesseraResult;
use tessera_interface::{ContentProvider, ExecutionContext};

#[derive(Debug, Deserialize)]
struct TextConfig {
    text: String,
}

/// Contributes a resolved text fragment; the text is also the packet data.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextProvider;

#[async_trait]
impl ContentProvider for TextProvider {
    fn name(&self) -> &str {
        "text"
    }

    async fn execute(
        &self,
        config: &JsonValue,
        _ctx: &ExecutionContext<'_>,
    ) -> TesseraResult<Vec<Packet>> {
        let config: TextConfig = parse_config(self.name(), config)?;
        Ok(vec![
            Packet::new(JsonValue::String(config.text.clone())).with_text(config.text),
        ])
    }
}
