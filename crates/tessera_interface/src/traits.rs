//! Trait definitions for the pipeline's external collaborators.

use crate::{CommandOutput, OutputPaths, PromptOptions};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::Path;
use std::sync::Arc;
use tessera_core::{ArtifactContent, Message, Packet, RawResponse, render_value};
use tessera_error::TesseraResult;

/// Model-calling client.
///
/// Implementations are expected to handle caching (keyed on the options' cache salt)
/// and transport retries; the pipeline only handles validation retries.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate output conforming to a JSON schema.
    async fn prompt_structured(
        &self,
        messages: &[Message],
        schema: &JsonValue,
        options: &PromptOptions,
    ) -> TesseraResult<JsonValue>;

    /// Generate plain text.
    async fn prompt_text(&self, messages: &[Message], options: &PromptOptions)
    -> TesseraResult<String>;

    /// Generate an unprocessed response (text, images or audio).
    async fn prompt_raw(
        &self,
        messages: &[Message],
        options: &PromptOptions,
    ) -> TesseraResult<RawResponse>;

    /// Provider name (e.g., "openai", "openrouter").
    fn provider_name(&self) -> &'static str;
}

/// Runs verification and post-processing commands against a materialized file.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command`, with `{{file}}` replaced by `file`.
    async fn run(&self, command: &str, file: &Path) -> TesseraResult<CommandOutput>;
}

/// Persists generated artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Write content to `path`, creating parent directories.
    async fn save(&self, content: &ArtifactContent, path: &Path) -> TesseraResult<()>;

    /// Copy an already persisted artifact.
    async fn copy(&self, from: &Path, to: &Path) -> TesseraResult<()>;
}

/// Shared services handed to plugins and strategies.
#[derive(Clone)]
pub struct RuntimeServices {
    /// Model client
    pub client: Arc<dyn ModelClient>,
    /// Artifact persistence
    pub store: Arc<dyn ArtifactStore>,
    /// External command runner
    pub commands: Arc<dyn CommandRunner>,
}

/// Everything a plugin sees while executing.
pub struct ExecutionContext<'a> {
    /// Snapshot of the running context (row, workspace, earlier plugin outputs)
    pub context: &'a JsonValue,
    /// Index of the step being executed
    pub step_index: usize,
    /// Shared services
    pub services: &'a RuntimeServices,
    /// Output directories
    pub paths: &'a OutputPaths,
}

/// A content provider: produces packets for a work item.
///
/// Configuration is resolved just in time: [`ContentProvider::prepare`] is called once
/// per invocation with an immutable snapshot of the running context, so later plugins
/// in a step can reference the output of earlier ones.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Registry name.
    fn name(&self) -> &str;

    /// Resolve templates and secrets in the raw configuration.
    ///
    /// The default renders every string in the configuration against the context.
    fn prepare(&self, raw_config: &JsonValue, context: &JsonValue) -> TesseraResult<JsonValue> {
        Ok(render_value(raw_config, context)?)
    }

    /// Produce zero or more packets. Zero packets drops the lineage.
    async fn execute(
        &self,
        config: &JsonValue,
        ctx: &ExecutionContext<'_>,
    ) -> TesseraResult<Vec<Packet>>;
}
