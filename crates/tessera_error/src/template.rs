//! Template rendering error types.

/// Specific error conditions for template rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TemplateErrorKind {
    /// Placeholder references a value that is not in the context
    #[display("Unknown reference '{}' in template", _0)]
    UnknownReference(String),
    /// Placeholder syntax could not be parsed
    #[display("Malformed placeholder '{}'", _0)]
    Malformed(String),
    /// Referenced value could not be rendered as text
    #[display("Failed to render '{}': {}", reference, message)]
    Render {
        /// Placeholder reference
        reference: String,
        /// Error message
        message: String,
    },
}

/// Template error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Template Error: {} at line {} in {}", kind, line, file)]
pub struct TemplateError {
    /// The specific error condition
    pub kind: TemplateErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl TemplateError {
    /// Create a new TemplateError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TemplateErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
