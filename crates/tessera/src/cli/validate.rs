//! Configuration check command handler.

use std::path::Path;
use std::sync::Arc;
use tessera::{
    FileSystemArtifactStore, Message, ModelClient, Pipeline, PipelineConfig, PluginRegistry,
    PromptOptions, RawResponse, RuntimeServices, ShellCommandRunner, TesseraResult,
};

/// Load and validate a configuration, resolving every plugin it names.
///
/// No model is contacted, so no API key is required.
#[tracing::instrument(skip_all, fields(config = %config.display()))]
pub fn validate_config(config: &Path) -> TesseraResult<()> {
    let pipeline_config = PipelineConfig::load(Some(config))?;
    let services = RuntimeServices {
        client: Arc::new(Offline),
        store: Arc::new(FileSystemArtifactStore::new(".")),
        commands: Arc::new(ShellCommandRunner::new()),
    };
    Pipeline::new(
        &pipeline_config,
        Arc::new(PluginRegistry::with_builtins()),
        services,
    )?;

    tracing::info!(
        steps = pipeline_config.steps().len(),
        concurrency = pipeline_config.concurrency(),
        "Configuration is valid"
    );
    Ok(())
}

/// Model client for a pipeline that is built but never run.
struct Offline;

#[async_trait::async_trait]
impl ModelClient for Offline {
    async fn prompt_structured(
        &self,
        _messages: &[Message],
        _schema: &serde_json::Value,
        _options: &PromptOptions,
    ) -> TesseraResult<serde_json::Value> {
        Err(offline())
    }

    async fn prompt_text(
        &self,
        _messages: &[Message],
        _options: &PromptOptions,
    ) -> TesseraResult<String> {
        Err(offline())
    }

    async fn prompt_raw(
        &self,
        _messages: &[Message],
        _options: &PromptOptions,
    ) -> TesseraResult<RawResponse> {
        Err(offline())
    }

    fn provider_name(&self) -> &'static str {
        "offline"
    }
}

fn offline() -> tessera::TesseraError {
    tessera::ConfigError::new("validation does not execute the pipeline").into()
}
