//! `split`: one packet per piece of a delimited string.

use super::parse_config;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tessera_core::Packet;
use tessera_error::TesseraResult;
use tessera_interface::{ContentProvider, ExecutionContext};

fn default_separator() -> String {
    ",".to_string()
}

#[derive(Debug, Deserialize)]
struct SplitConfig {
    input: String,
    #[serde(default = "default_separator")]
    separator: String,
    /// Also contribute each piece as a text fragment
    #[serde(default)]
    as_content: bool,
}

/// Splits a resolved string on a separator. Pieces are trimmed and empty pieces
/// skipped, so an empty input produces no packets and drops the lineage.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitProvider;

#[async_trait]
impl ContentProvider for SplitProvider {
    fn name(&self) -> &str {
        "split"
    }

    async fn execute(
        &self,
        config: &JsonValue,
        _ctx: &ExecutionContext<'_>,
    ) -> TesseraResult<Vec<Packet>> {
        let config: SplitConfig = parse_config(self.name(), config)?;
        Ok(config
            .input
            .split(config.separator.as_str())
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(|piece| {
                let packet = Packet::new(JsonValue::String(piece.to_string()));
                if config.as_content {
                    packet.with_text(piece)
                } else {
                    packet
                }
            })
            .collect())
    }
}
