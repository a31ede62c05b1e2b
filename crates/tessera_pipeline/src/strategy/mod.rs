//! Generation strategies.
//!
//! A strategy turns one fully resolved [`GenerationRequest`] into a
//! [`GenerationResult`]. The standard strategy runs a single validated generation
//! with optional critique rounds; the candidate strategy runs several standard
//! generations concurrently and lets a judge pick the winner.

mod candidate;
mod standard;

pub use candidate::{CandidateStrategy, JudgeSettings};
pub use standard::{Generated, StandardStrategy};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tessera_core::{GenerationResult, Message, Role};
use tessera_error::{TesseraError, TesseraErrorKind, TesseraResult};
use tessera_interface::PromptOptions;

/// Produces a generation result for one work item.
#[async_trait]
pub trait GenerationStrategy: Send + Sync {
    /// Run the generation.
    async fn generate(&self, request: &GenerationRequest) -> TesseraResult<GenerationResult>;

    /// Strategy name for logging.
    fn name(&self) -> &'static str;
}

/// Everything a strategy needs, resolved for one work item.
///
/// Prompts and the output path are already rendered; command templates are kept
/// raw because `{{file}}` is only known once a file exists.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// Rendered system prompt
    #[builder(default, setter(strip_option))]
    system_prompt: Option<String>,
    /// Persisted conversation of earlier steps
    #[builder(default)]
    history: Vec<Message>,
    /// Current user turn: plugin fragments followed by the rendered prompt
    user_turn: Message,
    /// JSON schema for structured output
    #[builder(default, setter(strip_option))]
    schema: Option<JsonValue>,
    /// Verification command template
    #[builder(default, setter(strip_option))]
    verify_command: Option<String>,
    /// Post-process command template
    #[builder(default, setter(strip_option))]
    post_process_command: Option<String>,
    /// Resolved output path
    #[builder(default, setter(strip_option))]
    output_path: Option<PathBuf>,
    /// Model options for generation calls
    #[builder(default)]
    options: PromptOptions,
    /// Base cache salt; attempts, critiques and candidates derive from it
    cache_salt: String,
    /// Extra attempts after the first failed one
    #[builder(default = "3")]
    max_retries: u32,
    /// Critique/regenerate rounds
    #[builder(default)]
    feedback_loops: u32,
    /// Model options for critique calls; the generation options when unset
    #[builder(default, setter(strip_option))]
    feedback_options: Option<PromptOptions>,
    /// Custom critique instructions
    #[builder(default, setter(strip_option))]
    feedback_instructions: Option<String>,
    /// Leave post-processing to the caller
    #[builder(default)]
    skip_post_process: bool,
    /// Extension for plain text artifacts
    #[builder(default = "\"txt\".to_string()")]
    text_extension: String,
}

impl GenerationRequest {
    /// Creates a new request builder.
    pub fn builder() -> GenerationRequestBuilder {
        GenerationRequestBuilder::default()
    }

    /// Conversation for the first attempt: system prompt, history, user turn.
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.history.len() + 2);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }
        messages.extend(self.history.iter().cloned());
        messages.push(self.user_turn.clone());
        messages
    }

    /// History without system turns, for judges and critics.
    pub fn non_system_history(&self) -> impl Iterator<Item = &Message> {
        self.history
            .iter()
            .filter(|message| message.role != Role::System)
    }

    /// The request for candidate `index`: its own cache salt and output path, with
    /// post-processing deferred to the winner.
    pub fn for_candidate(&self, index: usize) -> Self {
        let mut request = self.clone();
        request.cache_salt = format!("{}_cand_{}", self.cache_salt, index);
        request.output_path = self
            .output_path
            .as_deref()
            .map(|path| candidate_path(path, index));
        request.skip_post_process = true;
        request
    }
}

/// `<stem>_cand_<index><ext>` next to `path`.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::candidate_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     candidate_path(Path::new("out/slogan.txt"), 2),
///     PathBuf::from("out/slogan_cand_2.txt")
/// );
/// ```
pub fn candidate_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{}_cand_{}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_cand_{}", stem, index),
    };
    path.with_file_name(file_name)
}

/// The condition behind an error, without location details.
pub fn failure_message(err: &TesseraError) -> String {
    match err.kind() {
        TesseraErrorKind::Generation(e) => e.kind.to_string(),
        TesseraErrorKind::Model(e) => e.kind.to_string(),
        TesseraErrorKind::Plugin(e) => e.kind.to_string(),
        TesseraErrorKind::Template(e) => e.kind.to_string(),
        TesseraErrorKind::Storage(e) => e.kind.to_string(),
        TesseraErrorKind::Http(e) => e.message.clone(),
        TesseraErrorKind::Json(e) => e.message.clone(),
        TesseraErrorKind::Config(e) => e.message.clone(),
    }
}
