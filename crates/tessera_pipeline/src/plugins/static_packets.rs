//! `static`: packets listed in the configuration.

use super::parse_config;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tessera_core::Packet;
use tessera_error::TesseraResult;
use tessera_interface::{ContentProvider, ExecutionContext};

#[derive(Debug, Deserialize)]
struct StaticConfig {
    #[serde(default)]
    packets: Vec<StaticPacket>,
}

#[derive(Debug, Deserialize)]
struct StaticPacket {
    #[serde(default)]
    data: JsonValue,
    #[serde(default)]
    text: Option<String>,
}

/// Emits the configured packets, e.g. to fan a row out over a fixed list of
/// variations.
///
/// ```toml
/// [[steps.plugins]]
/// name = "static"
/// config = { packets = [{ data = "formal" }, { data = "playful", text = "Keep it light." }] }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticProvider;

#[async_trait]
impl ContentProvider for StaticProvider {
    fn name(&self) -> &str {
        "static"
    }

    async fn execute(
        &self,
        config: &JsonValue,
        _ctx: &ExecutionContext<'_>,
    ) -> TesseraResult<Vec<Packet>> {
        let config: StaticConfig = parse_config(self.name(), config)?;
        Ok(config
            .packets
            .into_iter()
            .map(|packet| match packet.text {
                Some(text) => Packet::new(packet.data).with_text(text),
                None => Packet::new(packet.data),
            })
            .collect())
    }
}
