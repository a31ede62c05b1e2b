//! Command-line interface module.

mod commands;
mod run;
mod validate;

pub use commands::{Cli, Commands};
pub use run::run_pipeline;
pub use validate::validate_config;
