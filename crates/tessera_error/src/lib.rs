//! Error types for the Tessera generation pipeline.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tessera_error::{TesseraResult, HttpError};
//!
//! fn fetch_data() -> TesseraResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! assert!(fetch_data().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod http;
mod json;
mod model;
mod plugin;
mod storage;
mod template;

pub use config::ConfigError;
pub use error::{TesseraError, TesseraErrorKind, TesseraResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use http::HttpError;
pub use json::JsonError;
pub use model::{ModelError, ModelErrorKind};
pub use plugin::{PluginError, PluginErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use template::{TemplateError, TemplateErrorKind};
