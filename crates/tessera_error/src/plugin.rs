//! Content provider plugin error types.

/// Specific error conditions for plugin resolution and execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum PluginErrorKind {
    /// No plugin registered under the requested name
    #[display("Plugin '{}' is not registered", _0)]
    NotRegistered(String),
    /// Plugin configuration is invalid
    #[display("Invalid configuration for plugin '{}': {}", plugin, message)]
    InvalidConfig {
        /// Plugin name
        plugin: String,
        /// Error message
        message: String,
    },
    /// Plugin execution failed
    #[display("Plugin '{}' failed: {}", plugin, message)]
    ExecutionFailed {
        /// Plugin name
        plugin: String,
        /// Error message
        message: String,
    },
}

/// Plugin error with location tracking.
///
/// # Examples
///
/// ```
/// use tessera_error::{PluginError, PluginErrorKind};
///
/// let err = PluginError::new(PluginErrorKind::NotRegistered("search".to_string()));
/// assert!(format!("{}", err).contains("search"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Plugin Error: {} at line {} in {}", kind, line, file)]
pub struct PluginError {
    /// The specific error condition
    pub kind: PluginErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PluginError {
    /// Create a new PluginError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PluginErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
