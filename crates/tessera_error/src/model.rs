//! Model client error types.

/// Specific error conditions raised by model clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ModelErrorKind {
    /// Transport-level failure (connection refused, timeout, TLS)
    #[display("Transport error: {}", _0)]
    Transport(String),
    /// Provider returned a non-success status
    #[display("API error {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body or message
        message: String,
    },
    /// Response body could not be interpreted
    #[display("Response parsing failed: {}", _0)]
    ResponseParsing(String),
    /// Response contained no usable payload
    #[display("Model returned an empty response")]
    EmptyResponse,
    /// No API key was configured
    #[display("Missing API key: {}", _0)]
    MissingApiKey(String),
    /// Request could not be built
    #[display("Request construction failed: {}", _0)]
    RequestConstruction(String),
}

impl ModelErrorKind {
    /// Whether this error is transient and the call may succeed if repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelErrorKind::Api { status, .. } => {
                matches!(*status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            ModelErrorKind::Transport(_) => true,
            _ => false,
        }
    }

    /// Retry parameters for this error: `(initial_backoff_ms, max_retries, max_delay_secs)`.
    pub fn retry_strategy_params(&self) -> (u64, usize, u64) {
        match self {
            ModelErrorKind::Api { status, .. } => match *status {
                429 => (5000, 3, 40),
                503 => (2000, 5, 60),
                500 | 502 | 504 => (1000, 3, 8),
                _ => (2000, 4, 30),
            },
            ModelErrorKind::Transport(_) => (1000, 3, 10),
            _ => (2000, 5, 60),
        }
    }
}

/// Model client error with location tracking.
///
/// # Examples
///
/// ```
/// use tessera_error::{ModelError, ModelErrorKind};
///
/// let err = ModelError::new(ModelErrorKind::Api { status: 503, message: "busy".into() });
/// assert!(err.kind.is_retryable());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Model Error: {} at {}:{}", kind, file, line)]
pub struct ModelError {
    /// The specific error kind
    pub kind: ModelErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// Source file where error occurred
    pub file: &'static str,
}

impl ModelError {
    /// Create a new model error.
    #[track_caller]
    pub fn new(kind: ModelErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
