//! Pipeline execution and candidate resolution for Tessera.
//!
//! A pipeline turns rows of structured data into generated artifacts by running a
//! sequence of steps. Each step runs its content-provider plugins, lets the
//! [`flow`] controller fan work items out, filter them or enrich their rows, and then
//! calls the model through a [`GenerationStrategy`]:
//!
//! - [`StandardStrategy`]: schema validation, external verification, retries and
//!   critique-driven refinement.
//! - [`CandidateStrategy`]: several standard generations in parallel, with a judge
//!   picking the winner.
//!
//! [`Pipeline`] runs every step for each row with bounded row concurrency.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod config;
mod extraction;
pub mod flow;
mod pipeline;
mod plugin;
pub mod plugins;
mod step;
mod strategy;

pub use command::ShellCommandRunner;
pub use config::{
    CandidateConfig, FeedbackConfig, ModelSettings, PipelineConfig, PluginConfig,
    ProviderSettings, StepConfig, StepConfigBuilder,
};
pub use extraction::{SchemaValidator, extract_json, parse_structured};
pub use pipeline::{Pipeline, RowOutcome};
pub use plugin::{PluginRegistry, PluginRun, PluginRunner};
pub use step::StepDriver;
pub use strategy::{
    CandidateStrategy, Generated, GenerationRequest, GenerationRequestBuilder,
    GenerationStrategy, JudgeSettings, StandardStrategy, candidate_path, failure_message,
};
