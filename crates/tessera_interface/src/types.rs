//! Value types shared by the collaborator traits.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Hint for how much reasoning a model should spend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReasoningEffort {
    /// Minimal reasoning
    Low,
    /// Provider default
    Medium,
    /// Extended reasoning
    High,
}

/// Per-call model options.
///
/// The cache salt disambiguates otherwise identical calls so that retries and
/// parallel candidates never share a cached response.
///
/// # Examples
///
/// ```
/// use tessera_interface::PromptOptions;
///
/// let base = PromptOptions::builder()
///     .model("gpt-4o-mini")
///     .temperature(0.7_f32)
///     .build()
///     .unwrap();
/// let salted = base.clone().with_cache_salt("row0_cand_1");
///
/// assert_eq!(base.cache_salt(), &None);
/// assert_eq!(salted.cache_salt().as_deref(), Some("row0_cand_1"));
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
    derive_builder::Builder,
)]
#[setters(prefix = "with_", strip_option, into)]
#[builder(default, setter(into, strip_option))]
pub struct PromptOptions {
    /// Provider model identifier
    model: Option<String>,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Reasoning effort hint
    reasoning_effort: Option<ReasoningEffort>,
    /// Cache disambiguation salt
    cache_salt: Option<String>,
}

impl PromptOptions {
    /// Creates a new options builder.
    pub fn builder() -> PromptOptionsBuilder {
        PromptOptionsBuilder::default()
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone, PartialEq, Eq, Default, derive_getters::Getters)]
pub struct CommandOutput {
    /// Exit status (-1 when terminated by a signal)
    status: i32,
    /// Captured standard output
    stdout: String,
    /// Captured standard error
    stderr: String,
}

impl CommandOutput {
    /// Assemble a command result.
    pub fn new(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Whether the command exited with status zero.
    pub fn success(&self) -> bool {
        self.status == 0
    }

    /// Standard error if present, otherwise standard output.
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Directories the pipeline writes to.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct OutputPaths {
    /// Root for relative output path templates
    output_dir: PathBuf,
    /// Directory for verification/post-process scratch files
    temp_dir: PathBuf,
}

impl OutputPaths {
    /// Create output paths.
    pub fn new(output_dir: impl Into<PathBuf>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            temp_dir: temp_dir.into(),
        }
    }

    /// Resolve a rendered output path against the output directory.
    pub fn resolve(&self, rendered: &str) -> PathBuf {
        let path = Path::new(rendered);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.output_dir.join(path)
        }
    }
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::new(".", std::env::temp_dir())
    }
}
