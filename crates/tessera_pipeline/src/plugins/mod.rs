//! Built-in content providers.

mod split;
mod static_packets;
mod text;

pub use split::SplitProvider;
pub use static_packets::StaticProvider;
pub use text::TextProvider;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tessera_error::{PluginError, PluginErrorKind};
use tessera_interface::ContentProvider;

/// Every built-in provider, ready for registration.
pub fn builtin_providers() -> Vec<Arc<dyn ContentProvider>> {
    vec![
        Arc::new(StaticProvider),
        Arc::new(SplitProvider),
        Arc::new(TextProvider),
    ]
}

/// Deserialize a resolved plugin configuration.
fn parse_config<T: DeserializeOwned>(plugin: &str, config: &JsonValue) -> Result<T, PluginError> {
    serde_json::from_value(config.clone()).map_err(|e| {
        PluginError::new(PluginErrorKind::InvalidConfig {
            plugin: plugin.to_string(),
            message: e.to_string(),
        })
    })
}
