//! Pipeline configuration.
//!
//! Configuration is layered with the `config` crate. Later sources override earlier
//! ones:
//! 1. Bundled defaults (`tessera.toml` shipped with the workspace)
//! 2. User config in the home directory (`~/.config/tessera/tessera.toml`)
//! 3. An explicit file passed by the caller
//! 4. `TESSERA_*` environment variables (`__` separates nested keys)

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use tessera_core::OutputStrategy;
use tessera_error::{ConfigError, TesseraError, TesseraResult};
use tessera_interface::{OutputPaths, PromptOptions, ReasoningEffort};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../tessera.toml");

fn default_concurrency() -> usize {
    4
}

fn default_max_retries() -> u32 {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_text_extension() -> String {
    "txt".to_string()
}

/// Model selection and sampling parameters.
///
/// Unset fields fall back to the pipeline-wide defaults.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Default,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_setters::Setters,
)]
#[setters(prefix = "with_", strip_option, into)]
pub struct ModelSettings {
    /// Provider model identifier
    #[serde(default)]
    model: Option<String>,
    /// Sampling temperature
    #[serde(default)]
    temperature: Option<f32>,
    /// Reasoning effort hint
    #[serde(default)]
    reasoning_effort: Option<ReasoningEffort>,
}

impl ModelSettings {
    /// Fill unset fields from `fallback`.
    pub fn merged(&self, fallback: &ModelSettings) -> ModelSettings {
        ModelSettings {
            model: self.model.clone().or_else(|| fallback.model.clone()),
            temperature: self.temperature.or(fallback.temperature),
            reasoning_effort: self.reasoning_effort.or(fallback.reasoning_effort),
        }
    }

    /// Prompt options without a cache salt.
    pub fn to_options(&self) -> PromptOptions {
        let mut options = PromptOptions::default();
        if let Some(model) = &self.model {
            options = options.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            options = options.with_temperature(temperature);
        }
        if let Some(effort) = self.reasoning_effort {
            options = options.with_reasoning_effort(effort);
        }
        options
    }
}

/// Critique-driven refinement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct FeedbackConfig {
    /// Number of critique/regenerate rounds after the first generation
    #[serde(default)]
    loops: u32,
    /// Model used to write critiques; defaults to the step model
    #[serde(default)]
    model: Option<ModelSettings>,
    /// Custom critique instructions
    #[serde(default)]
    instructions: Option<String>,
}

impl FeedbackConfig {
    /// Feedback with `loops` rounds and default model and instructions.
    pub fn new(loops: u32) -> Self {
        Self {
            loops,
            model: None,
            instructions: None,
        }
    }

    /// Override the critique instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Override the critique model.
    pub fn with_model(mut self, model: ModelSettings) -> Self {
        self.model = Some(model);
        self
    }
}

/// Parallel candidates with an optional judge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct CandidateConfig {
    /// Number of candidates generated concurrently
    count: usize,
    /// Judge model; without one the first successful candidate wins
    #[serde(default)]
    judge_model: Option<ModelSettings>,
    /// Custom judge instructions
    #[serde(default)]
    judge_instructions: Option<String>,
}

impl CandidateConfig {
    /// `count` candidates without a judge.
    pub fn new(count: usize) -> Self {
        Self {
            count,
            judge_model: None,
            judge_instructions: None,
        }
    }

    /// Select the winner with this model.
    pub fn with_judge(mut self, model: ModelSettings) -> Self {
        self.judge_model = Some(model);
        self
    }

    /// Override the judge instructions.
    pub fn with_judge_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.judge_instructions = Some(instructions.into());
        self
    }
}

/// A content provider invocation within a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PluginConfig {
    /// Registry name of the provider
    name: String,
    /// Context key for the plugin's output; defaults to `name`
    #[serde(default)]
    key: Option<String>,
    /// Raw configuration, resolved against the running context before execution
    #[serde(default)]
    config: JsonValue,
    /// How this plugin's packets affect rows and cardinality; the step's
    /// `plugin_output` when unset
    #[serde(default)]
    output: Option<OutputStrategy>,
}

impl PluginConfig {
    /// Plugin invocation with a raw configuration.
    pub fn new(name: impl Into<String>, config: JsonValue) -> Self {
        Self {
            name: name.into(),
            key: None,
            config,
            output: None,
        }
    }

    /// Store the plugin's output under a different context key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Give this plugin its own output strategy.
    pub fn with_output(mut self, output: OutputStrategy) -> Self {
        self.output = Some(output);
        self
    }

    /// Context key for this plugin's output.
    pub fn context_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// One pipeline step.
///
/// A step runs its plugins, then, if it has a prompt, one generation per surviving
/// work item. The step name is the workspace namespace for both.
///
/// # Examples
///
/// ```
/// use tessera_pipeline::{CandidateConfig, StepConfig};
///
/// let step = StepConfig::builder()
///     .name("slogan")
///     .prompt("Write a slogan for a {{industry}}")
///     .candidates(CandidateConfig::new(3))
///     .build()
///     .unwrap();
/// assert_eq!(*step.max_retries(), 3);
/// assert!(step.has_generation());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into, strip_option))]
pub struct StepConfig {
    /// Step name and workspace namespace
    name: String,
    /// System prompt template
    #[serde(default)]
    #[builder(default)]
    system_prompt: Option<String>,
    /// User prompt template; steps without one only run plugins
    #[serde(default)]
    #[builder(default)]
    prompt: Option<String>,
    /// JSON schema for structured output
    #[serde(default)]
    #[builder(default)]
    schema: Option<JsonValue>,
    /// Verification command template (`{{file}}` is the candidate file)
    #[serde(default)]
    #[builder(default)]
    verify_command: Option<String>,
    /// Post-process command template, run best-effort on the final artifact
    #[serde(default)]
    #[builder(default)]
    post_process_command: Option<String>,
    /// Model overrides for this step
    #[serde(default)]
    #[builder(default)]
    model: ModelSettings,
    /// Extra attempts after the first failed one
    #[serde(default = "default_max_retries")]
    #[builder(default = "default_max_retries()")]
    max_retries: u32,
    /// Critique-driven refinement
    #[serde(default)]
    #[builder(default)]
    feedback: Option<FeedbackConfig>,
    /// Parallel candidates
    #[serde(default)]
    #[builder(default)]
    candidates: Option<CandidateConfig>,
    /// Output path template for the generated artifact
    #[serde(default)]
    #[builder(default)]
    output_path: Option<String>,
    /// Extension used for plain text artifacts
    #[serde(default = "default_text_extension")]
    #[builder(default = "default_text_extension()")]
    text_extension: String,
    /// Content providers, run in order
    #[serde(default)]
    #[builder(default, setter(custom))]
    plugins: Vec<PluginConfig>,
    /// Output strategy for plugins that do not set their own
    #[serde(default)]
    #[builder(default)]
    plugin_output: OutputStrategy,
    /// How the generation result affects rows and cardinality
    #[serde(default)]
    #[builder(default)]
    output: OutputStrategy,
}

impl StepConfig {
    /// Creates a new step builder.
    pub fn builder() -> StepConfigBuilder {
        StepConfigBuilder::default()
    }

    /// Whether the step calls the model.
    pub fn has_generation(&self) -> bool {
        self.prompt.is_some()
    }

    /// Number of candidates generated per work item (1 without a candidate config).
    pub fn candidate_count(&self) -> usize {
        self.candidates
            .as_ref()
            .map(|c| *c.count())
            .unwrap_or(1)
            .max(1)
    }
}

impl StepConfigBuilder {
    /// Append a plugin invocation.
    pub fn plugin(&mut self, plugin: PluginConfig) -> &mut Self {
        self.plugins.get_or_insert_with(Vec::new).push(plugin);
        self
    }
}

/// Model provider connection settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, derive_getters::Getters)]
pub struct ProviderSettings {
    /// Chat completions endpoint base URL
    #[serde(default)]
    base_url: Option<String>,
    /// API key; `TESSERA_API_KEY` is used when unset
    #[serde(default)]
    api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    timeout_secs: Option<u64>,
    /// Maximum cached responses
    #[serde(default)]
    cache_capacity: Option<usize>,
    /// Cache entry lifetime in seconds
    #[serde(default)]
    cache_ttl_secs: Option<u64>,
    /// Transport retries for rate limits and server errors
    #[serde(default)]
    max_transport_retries: Option<usize>,
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
pub struct PipelineConfig {
    /// Rows processed concurrently
    #[serde(default = "default_concurrency")]
    concurrency: usize,
    /// Root for relative output paths
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    /// Directory for scratch files; the system temp directory when unset
    #[serde(default)]
    temp_dir: Option<PathBuf>,
    /// Default model settings for every step
    #[serde(default)]
    model: ModelSettings,
    /// Provider connection
    #[serde(default)]
    provider: ProviderSettings,
    /// Steps, run in order for every row
    #[serde(default)]
    steps: Vec<StepConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            output_dir: default_output_dir(),
            temp_dir: None,
            model: ModelSettings::default(),
            provider: ProviderSettings::default(),
            steps: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Configuration with the given steps and default settings.
    pub fn with_steps(steps: Vec<StepConfig>) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    /// Override the row concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Override the default model settings.
    pub fn with_model(mut self, model: ModelSettings) -> Self {
        self.model = model;
        self
    }

    /// Override the output directory.
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Parse an inline TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or does not describe a pipeline.
    pub fn from_toml_str(toml_str: &str) -> TesseraResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| {
            TesseraError::from(ConfigError::new(format!(
                "Failed to parse configuration: {}",
                e
            )))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with precedence: environment > explicit file > home dir >
    /// bundled defaults.
    ///
    /// The home directory file is optional; an explicit file must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the merged configuration is
    /// invalid.
    #[instrument(fields(path = ?path.map(Path::display)))]
    pub fn load(path: Option<&Path>) -> TesseraResult<Self> {
        debug!("Loading configuration: env > file > home dir > bundled defaults");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/tessera/tessera.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("TESSERA")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder
            .build()
            .map_err(|e| {
                TesseraError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                TesseraError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.validate()?;
        debug!(steps = config.steps.len(), "Configuration loaded");
        Ok(config)
    }

    /// Check structural constraints serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error for zero concurrency, duplicate or empty step names and
    /// zero-candidate steps.
    pub fn validate(&self) -> TesseraResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::new("concurrency must be at least 1").into());
        }

        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(ConfigError::new("step names must not be empty").into());
            }
            if !seen.insert(step.name.as_str()) {
                return Err(
                    ConfigError::new(format!("duplicate step name '{}'", step.name)).into(),
                );
            }
            if step.candidates.as_ref().is_some_and(|c| c.count == 0) {
                return Err(ConfigError::new(format!(
                    "step '{}' requests zero candidates",
                    step.name
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Output directories derived from this configuration.
    pub fn output_paths(&self) -> OutputPaths {
        let temp_dir = self.temp_dir.clone().unwrap_or_else(std::env::temp_dir);
        OutputPaths::new(self.output_dir.clone(), temp_dir)
    }
}
