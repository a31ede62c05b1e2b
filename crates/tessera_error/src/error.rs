//! Top-level error wrapper types.

use crate::{
    ConfigError, GenerationError, HttpError, JsonError, ModelError, PluginError, StorageError,
    TemplateError,
};

/// Every error condition the pipeline can surface.
///
/// # Examples
///
/// ```
/// use tessera_error::{TesseraError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: TesseraError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TesseraErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Model client error
    #[from(ModelError)]
    Model(ModelError),
    /// Template rendering error
    #[from(TemplateError)]
    Template(TemplateError),
    /// Plugin error
    #[from(PluginError)]
    Plugin(PluginError),
    /// Generation error
    #[from(GenerationError)]
    Generation(GenerationError),
}

/// Tessera error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tessera_error::{TesseraResult, ConfigError};
///
/// fn might_fail() -> TesseraResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tessera Error: {}", _0)]
pub struct TesseraError(Box<TesseraErrorKind>);

impl TesseraError {
    /// Create a new error from a kind.
    pub fn new(kind: TesseraErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TesseraErrorKind {
        &self.0
    }

    /// Whether the failed call may succeed if repeated.
    ///
    /// Transport failures and transient provider statuses (rate limits, 5xx) are
    /// retryable; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            TesseraErrorKind::Model(e) => e.kind.is_retryable(),
            TesseraErrorKind::Http(_) => true,
            _ => false,
        }
    }
}

// Generic From implementation for any type that converts to TesseraErrorKind
impl<T> From<T> for TesseraError
where
    T: Into<TesseraErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tessera operations.
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;
