//! Trait definitions for the Tessera generation pipeline.
//!
//! The pipeline core depends only on these traits: the model client, content
//! provider plugins, the command runner and artifact persistence are all supplied
//! from outside.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{
    ArtifactStore, CommandRunner, ContentProvider, ExecutionContext, ModelClient, RuntimeServices,
};
pub use types::{CommandOutput, OutputPaths, PromptOptions, PromptOptionsBuilder, ReasoningEffort};
