//! Tessera: a batch generation pipeline.
//!
//! Rows of structured data flow through a sequence of steps. Each step enriches rows
//! with content-provider plugins, fans them out or filters them, and generates an
//! artifact per row with a language model, validating, verifying, refining and (with
//! several candidates) judging the output.
//!
//! # Architecture
//!
//! - `tessera_error` - Error types
//! - `tessera_core` - Work items, messages, artifacts, templates
//! - `tessera_interface` - Collaborator traits (model client, plugins, storage, commands)
//! - `tessera_storage` - Atomic filesystem persistence
//! - `tessera_models` - OpenAI-compatible client, response cache, transport retries
//! - `tessera_pipeline` - Flow controller, plugin runner, strategies, step driver
//!
//! This crate re-exports everything and adds the pieces the binary is assembled from.
//!
//! ```rust,ignore
//! use tessera::{Pipeline, PipelineConfig, PluginRegistry, build_services};
//! use std::sync::Arc;
//!
//! # async fn run() -> tessera::TesseraResult<()> {
//! let config = PipelineConfig::load(Some("pipeline.toml".as_ref()))?;
//! let services = build_services(&config)?;
//! let pipeline = Pipeline::new(&config, Arc::new(PluginRegistry::with_builtins()), services)?;
//! let rows = tessera::read_rows("rows.jsonl".as_ref()).await?;
//! let outcomes = pipeline.run(rows).await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod io;
mod observability;
mod services;

pub use io::{outcome_records, parse_rows, read_rows, to_jsonl};
pub use observability::{LogConfig, init_logging};
pub use services::build_services;

pub use tessera_core::*;
pub use tessera_error::*;
pub use tessera_interface::*;
pub use tessera_models::{
    CachingClient, OpenAiCompatibleClient, ResponseCacheConfig, RetryPolicy, RetryingClient,
};
pub use tessera_pipeline::*;
pub use tessera_storage::FileSystemArtifactStore;
