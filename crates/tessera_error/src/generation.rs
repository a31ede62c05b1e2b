//! Generation error types.

/// Specific error conditions raised while generating an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Structured output did not parse or match the schema
    #[display("Schema validation failed: {}", _0)]
    SchemaValidation(String),
    /// The configured schema itself is invalid
    #[display("Invalid schema: {}", _0)]
    InvalidSchema(String),
    /// External verification command rejected the artifact
    #[display("Verification failed (exit status {}): {}", status, output)]
    VerificationFailed {
        /// Exit status of the verification command
        status: i32,
        /// Captured command output
        output: String,
    },
    /// External command could not be run at all
    #[display("Command '{}' could not be run: {}", command, message)]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Error message
        message: String,
    },
    /// Response did not carry the expected modality
    #[display("Unexpected response: {}", _0)]
    UnexpectedResponse(String),
    /// Every attempt of the retry loop failed
    #[display("Generation failed after {} attempts. Last error: {}", attempts, last_error)]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Message of the last failure
        last_error: String,
    },
    /// Every candidate failed
    #[display("All {} candidates failed: {}", count, errors)]
    CandidatesExhausted {
        /// Number of candidates attempted
        count: usize,
        /// Concatenated candidate errors
        errors: String,
    },
    /// Judge call failed or returned an unusable decision
    #[display("Judge failed: {}", _0)]
    Judge(String),
    /// Step or strategy misconfiguration
    #[display("Configuration error: {}", _0)]
    Configuration(String),
}

/// Generation error with location tracking.
///
/// # Examples
///
/// ```
/// use tessera_error::{GenerationError, GenerationErrorKind};
///
/// let err = GenerationError::new(GenerationErrorKind::Exhausted {
///     attempts: 4,
///     last_error: "bad json".to_string(),
/// });
/// assert!(format!("{}", err).contains("after 4 attempts"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The specific error condition
    pub kind: GenerationErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
