//! Standard strategy: one validated generation with optional critique rounds.

use super::{GenerationRequest, GenerationStrategy, failure_message};
use crate::extraction::{SchemaValidator, parse_structured};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tessera_core::{Artifact, GenerationResult, Message, Role};
use tessera_error::{
    GenerationError, GenerationErrorKind, StorageError, StorageErrorKind, TesseraResult,
};
use tessera_interface::{OutputPaths, PromptOptions, RuntimeServices};

const DEFAULT_CRITIQUE_INSTRUCTIONS: &str = "You are a demanding reviewer. Examine the \
assistant's latest response against the user's request and list every concrete problem \
that must be fixed. Be specific and brief.";

/// A validated artifact and where it was persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    /// The accepted artifact
    pub artifact: Artifact,
    /// Parsed structured output, when a schema was configured
    pub structured: Option<JsonValue>,
    /// Path the artifact was saved to
    pub persisted: Option<PathBuf>,
}

impl Generated {
    /// The generation result for this artifact, as if stored at `persisted`.
    pub fn result_at(&self, persisted: Option<&Path>) -> GenerationResult {
        let column_value = self.artifact.column_value(persisted);
        let history_message = match &self.artifact {
            Artifact::Text { content, .. } => Message::assistant(content.clone()),
            Artifact::Image { source, .. } => {
                let location = persisted
                    .map(|path| path.display().to_string())
                    .or_else(|| source.as_url().map(str::to_string));
                Message::assistant(placeholder(&self.artifact, location))
            }
            Artifact::Audio { .. } => Message::assistant(placeholder(
                &self.artifact,
                persisted.map(|path| path.display().to_string()),
            )),
        };
        GenerationResult::new(history_message, Some(column_value), self.structured.clone())
    }

    /// The generation result for this artifact at its own path.
    pub fn result(&self) -> GenerationResult {
        self.result_at(self.persisted.as_deref())
    }
}

fn placeholder(artifact: &Artifact, location: Option<String>) -> String {
    match location {
        Some(location) => format!("[Generated {}: {}]", artifact.kind(), location),
        None => format!("[Generated {}]", artifact.kind()),
    }
}

/// Runs a single generation through the feedback and retry loops.
///
/// Each model call gets its own cache salt, `<base>_f<iteration>_a<attempt>`, and
/// each critique call `<base>_critique_<iteration>`, so no two calls of a run share
/// a cached response.
#[derive(Clone)]
pub struct StandardStrategy {
    services: RuntimeServices,
    paths: OutputPaths,
}

impl std::fmt::Debug for StandardStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardStrategy")
            .field("provider", &self.services.client.provider_name())
            .field("paths", &self.paths)
            .finish()
    }
}

impl StandardStrategy {
    /// Create the strategy over shared services.
    pub fn new(services: RuntimeServices, paths: OutputPaths) -> Self {
        Self { services, paths }
    }

    /// Shared services.
    pub fn services(&self) -> &RuntimeServices {
        &self.services
    }

    /// Generate, validate, persist and (unless deferred) post-process an artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema is invalid, every attempt of an iteration
    /// fails, or the artifact cannot be persisted.
    #[tracing::instrument(skip_all, fields(salt = %request.cache_salt()))]
    pub async fn produce(&self, request: &GenerationRequest) -> TesseraResult<Generated> {
        let validator = request
            .schema()
            .as_ref()
            .map(SchemaValidator::compile)
            .transpose()?;

        let mut conversation = request.conversation();
        let mut accepted = self
            .generate_with_retries(request, &conversation, validator.as_ref(), 0)
            .await?;

        for iteration in 1..=*request.feedback_loops() {
            let critique = match self
                .critique(request, &conversation, &accepted.artifact, iteration)
                .await
            {
                Ok(critique) => critique,
                Err(e) => {
                    tracing::warn!(iteration, error = %e, "Critique failed; keeping the current result");
                    break;
                }
            };

            conversation.extend(accepted.artifact.attempt_turns());
            conversation.push(Message::user(format!(
                "A reviewer critiqued your previous response:\n\n{}\n\nFix every issue raised and respond again with the complete improved result.",
                critique.trim()
            )));

            accepted = self
                .generate_with_retries(request, &conversation, validator.as_ref(), iteration)
                .await?;
            tracing::debug!(iteration, "Feedback iteration complete");
        }

        let persisted = self.persist(request, &accepted.artifact).await?;

        if let Some(command) = request.post_process_command() {
            if !request.skip_post_process() {
                self.post_process(command, &accepted.artifact, persisted.as_deref())
                    .await;
            }
        }

        Ok(Generated {
            artifact: accepted.artifact,
            structured: accepted.structured,
            persisted,
        })
    }

    /// Run the post-process command on the artifact: on its persisted file if there
    /// is one, otherwise on a throwaway scratch file. Failures are logged only.
    #[tracing::instrument(skip(self, artifact))]
    pub async fn post_process(&self, command: &str, artifact: &Artifact, persisted: Option<&Path>) {
        let outcome = match persisted {
            Some(path) => self.services.commands.run(command, path).await,
            None => match artifact.content() {
                Some(content) => match self
                    .scratch_file(artifact.extension(), content.as_bytes().to_vec())
                    .await
                {
                    Ok(scratch) => self.services.commands.run(command, scratch.path()).await,
                    Err(e) => Err(e),
                },
                None => {
                    tracing::warn!("Artifact has no local content; skipping post-process");
                    return;
                }
            },
        };

        match outcome {
            Ok(output) if output.success() => tracing::debug!("Post-process succeeded"),
            Ok(output) => tracing::warn!(
                status = output.status(),
                output = %output.diagnostics(),
                "Post-process command failed"
            ),
            Err(e) => tracing::warn!(error = %e, "Post-process command could not be run"),
        }
    }

    async fn generate_with_retries(
        &self,
        request: &GenerationRequest,
        conversation: &[Message],
        validator: Option<&SchemaValidator>,
        iteration: u32,
    ) -> TesseraResult<Generated> {
        let attempts = request.max_retries() + 1;
        let mut messages = conversation.to_vec();
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let options = request.options().clone().with_cache_salt(format!(
                "{}_f{}_a{}",
                request.cache_salt(),
                iteration,
                attempt
            ));

            match self.attempt(request, &messages, &options, validator).await {
                Ok(generated) => {
                    tracing::debug!(iteration, attempt, "Attempt accepted");
                    return Ok(generated);
                }
                Err(e) => {
                    last_error = failure_message(&e);
                    tracing::warn!(iteration, attempt, error = %last_error, "Attempt failed");
                    messages.push(Message::user(format!(
                        "The previous response failed validation: {}\nCorrect the problem and respond again.",
                        last_error
                    )));
                }
            }
        }

        Err(GenerationError::new(GenerationErrorKind::Exhausted {
            attempts,
            last_error,
        })
        .into())
    }

    async fn attempt(
        &self,
        request: &GenerationRequest,
        messages: &[Message],
        options: &PromptOptions,
        validator: Option<&SchemaValidator>,
    ) -> TesseraResult<Generated> {
        let generated = match (validator, request.schema()) {
            (Some(validator), Some(schema)) => {
                let value = self
                    .services
                    .client
                    .prompt_structured(messages, schema, options)
                    .await?;
                let value = parse_structured(value)?;
                let canonical = validator.validate(&value)?;
                Generated {
                    artifact: Artifact::text(canonical, "json"),
                    structured: Some(value),
                    persisted: None,
                }
            }
            _ => {
                let raw = self.services.client.prompt_raw(messages, options).await?;
                Generated {
                    artifact: Artifact::from_raw(&raw, request.text_extension())?,
                    structured: None,
                    persisted: None,
                }
            }
        };

        if let Some(command) = request.verify_command() {
            self.verify(command, &generated.artifact).await?;
        }

        Ok(generated)
    }

    async fn verify(&self, command: &str, artifact: &Artifact) -> TesseraResult<()> {
        let Some(content) = artifact.content() else {
            tracing::warn!("Artifact has no local content; skipping verification");
            return Ok(());
        };

        // Removed when dropped, on every exit path
        let scratch = self
            .scratch_file(artifact.extension(), content.as_bytes().to_vec())
            .await?;
        let output = self
            .services
            .commands
            .run(command, scratch.path())
            .await
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::CommandFailed {
                    command: command.to_string(),
                    message: failure_message(&e),
                })
            })?;

        if output.success() {
            Ok(())
        } else {
            Err(GenerationError::new(GenerationErrorKind::VerificationFailed {
                status: *output.status(),
                output: output.diagnostics().to_string(),
            })
            .into())
        }
    }

    async fn critique(
        &self,
        request: &GenerationRequest,
        conversation: &[Message],
        artifact: &Artifact,
        iteration: u32,
    ) -> TesseraResult<String> {
        let instructions = request
            .feedback_instructions()
            .clone()
            .unwrap_or_else(|| DEFAULT_CRITIQUE_INSTRUCTIONS.to_string());

        let mut messages = vec![Message::system(instructions)];
        messages.extend(
            conversation
                .iter()
                .filter(|message| message.role != Role::System)
                .cloned(),
        );
        messages.extend(artifact.attempt_turns());
        messages.push(Message::user(
            "Critique the response above. List the concrete problems that must be fixed.",
        ));

        let options = request
            .feedback_options()
            .clone()
            .unwrap_or_else(|| request.options().clone())
            .with_cache_salt(format!("{}_critique_{}", request.cache_salt(), iteration));

        let critique = self.services.client.prompt_text(&messages, &options).await?;
        tracing::debug!(iteration, length = critique.len(), "Critique received");
        Ok(critique)
    }

    async fn persist(
        &self,
        request: &GenerationRequest,
        artifact: &Artifact,
    ) -> TesseraResult<Option<PathBuf>> {
        let Some(path) = request.output_path() else {
            return Ok(None);
        };

        match artifact.content() {
            Some(content) => {
                self.services.store.save(&content, path).await?;
                tracing::debug!(path = %path.display(), kind = %artifact.kind(), "Artifact persisted");
                Ok(Some(path.clone()))
            }
            None => {
                tracing::warn!(path = %path.display(), "Remote artifact cannot be persisted; keeping its URL");
                Ok(None)
            }
        }
    }

    /// Write `bytes` to a fresh scratch file in the temp directory. The file is
    /// created and written on the blocking pool.
    async fn scratch_file(&self, extension: &str, bytes: Vec<u8>) -> TesseraResult<NamedTempFile> {
        let prefix = format!("tessera_{}_", chrono::Utc::now().format("%Y%m%d%H%M%S%3f"));
        let suffix = format!(".{}", extension);
        let dir = self.paths.temp_dir().clone();

        tokio::task::spawn_blocking(move || -> TesseraResult<NamedTempFile> {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)
                .map_err(|e| StorageError::new(StorageErrorKind::TempFile(e.to_string())))?;

            file.write_all(&bytes)
                .and_then(|_| file.flush())
                .map_err(|e| StorageError::new(StorageErrorKind::FileWrite(e.to_string())))?;

            Ok(file)
        })
        .await
        .map_err(|e| StorageError::new(StorageErrorKind::TempFile(e.to_string())))?
    }
}

#[async_trait]
impl GenerationStrategy for StandardStrategy {
    async fn generate(&self, request: &GenerationRequest) -> TesseraResult<GenerationResult> {
        Ok(self.produce(request).await?.result())
    }

    fn name(&self) -> &'static str {
        "standard"
    }
}
